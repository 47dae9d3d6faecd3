use std::sync::Arc;

use clap::Parser;
use greetings_galore::compositor::GreetingFonts;
use greetings_galore::config::{AppConfig, setup_logging};
use greetings_galore::gemini::{GeminiClient, TextGenerator};
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = greetings_galore::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = AppConfig::from(cli);

    let fonts = match GreetingFonts::load(
        &config.greeting_font_path,
        config.greeting_font_size,
        &config.caption_font_path,
    ) {
        Ok(fonts) => fonts,
        Err(err) => {
            error!("Failed to load fonts: {}", err);
            return;
        }
    };

    let generator: Arc<dyn TextGenerator> = match GeminiClient::new(&config.gemini) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!("Failed to set up the Gemini client: {}", err);
            return;
        }
    };
    info!("Using model {}", config.gemini.model);

    if let Err(err) = greetings_galore::web::setup_server(&config, fonts, generator).await {
        error!("Application error: {}", err);
    }
}
