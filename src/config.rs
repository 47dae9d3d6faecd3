//! Config handling

use std::num::NonZeroU16;
use std::path::PathBuf;
use std::time::Duration;

use tracing::log::LevelFilter;

use crate::cli::CliOptions;
use crate::gemini::GeminiSettings;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Runtime configuration, built from the CLI.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address to bind
    pub listen_address: String,
    /// Port to bind
    pub port: NonZeroU16,
    /// Font used for the greeting
    pub greeting_font_path: PathBuf,
    /// Pixel size of the greeting
    pub greeting_font_size: f32,
    /// Font used for the caption
    pub caption_font_path: PathBuf,
    /// Where the rendered PNG goes
    pub output_path: PathBuf,
    /// Text generation settings
    pub gemini: GeminiSettings,
}

impl From<CliOptions> for AppConfig {
    fn from(cli: CliOptions) -> Self {
        Self {
            listen_address: cli.listen_address,
            port: cli.port,
            greeting_font_path: cli.greeting_font_path,
            greeting_font_size: cli.greeting_font_size,
            caption_font_path: cli.caption_font_path,
            output_path: cli.output_path,
            gemini: GeminiSettings {
                api_key: cli.gemini_api_key,
                model: cli.gemini_model,
                api_base: cli.gemini_api_base,
                timeout: Duration::from_secs(cli.gemini_timeout),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_defaults_fill_config() {
        let cli = CliOptions::try_parse_from(["greetings-galore", "--gemini-api-key", "k"])
            .expect("parse cli");
        let config = AppConfig::from(cli);
        assert_eq!(config.port.get(), 9000);
        assert_eq!(config.output_path, PathBuf::from("./output.png"));
        assert_eq!(
            config.greeting_font_path,
            PathBuf::from("./fonts/DejaVuSans.ttf")
        );
        assert_eq!(config.greeting_font_size, 24.0);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.timeout, Duration::from_secs(60));
    }

    #[test]
    fn cli_overrides_paths() {
        let cli = CliOptions::try_parse_from([
            "greetings-galore",
            "--gemini-api-key",
            "k",
            "--output-path",
            "/tmp/card.png",
            "--caption-font-path",
            "/fonts/caption.ttf",
        ])
        .expect("parse cli");
        let config = AppConfig::from(cli);
        assert_eq!(config.output_path, PathBuf::from("/tmp/card.png"));
        assert_eq!(config.caption_font_path, PathBuf::from("/fonts/caption.ttf"));
    }
}
