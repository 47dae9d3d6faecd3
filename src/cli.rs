//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;
use url::Url;

use crate::compositor::DEFAULT_GREETING_FONT_SIZE;
use crate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "GREETINGS_DEBUG")]
    /// Enable debug logging. Env: GREETINGS_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "GREETINGS_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: GREETINGS_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "GREETINGS_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: GREETINGS_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    /// Gemini API key.
    /// Env: GEMINI_API_KEY
    pub gemini_api_key: String,
    #[clap(long, default_value = DEFAULT_MODEL, env = "GREETINGS_GEMINI_MODEL")]
    /// Gemini model used for the greeting text.
    /// Env: GREETINGS_GEMINI_MODEL
    pub gemini_model: String,
    #[clap(long, default_value = DEFAULT_API_BASE, env = "GREETINGS_GEMINI_API_BASE")]
    /// Gemini API root, override for testing.
    /// Env: GREETINGS_GEMINI_API_BASE
    pub gemini_api_base: Url,
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "GREETINGS_GEMINI_TIMEOUT")]
    /// Seconds to wait for Gemini before giving up.
    /// Env: GREETINGS_GEMINI_TIMEOUT
    pub gemini_timeout: u64,

    #[clap(
        long,
        default_value = "./fonts/DejaVuSans.ttf",
        env = "GREETINGS_GREETING_FONT_PATH"
    )]
    /// Font for the greeting text.
    /// Env: GREETINGS_GREETING_FONT_PATH
    pub greeting_font_path: PathBuf,
    #[clap(long, default_value_t = DEFAULT_GREETING_FONT_SIZE, env = "GREETINGS_GREETING_FONT_SIZE")]
    /// Pixel size of the greeting text.
    /// Env: GREETINGS_GREETING_FONT_SIZE
    pub greeting_font_size: f32,
    #[clap(
        long,
        default_value = "./fonts/DejaVuSansCondensed.ttf",
        env = "GREETINGS_CAPTION_FONT_PATH"
    )]
    /// Font for the `@Greetings Galore` caption.
    /// Env: GREETINGS_CAPTION_FONT_PATH
    pub caption_font_path: PathBuf,
    #[clap(long, short, default_value = "./output.png", env = "GREETINGS_OUTPUT_PATH")]
    /// Where the rendered PNG is written, overwritten on every render.
    /// Env: GREETINGS_OUTPUT_PATH
    pub output_path: PathBuf,
}
