//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_IMAGE_MODEL, DEFAULT_IMAGE_RETRY_ATTEMPTS, DEFAULT_IMAGE_RETRY_DELAY_MS,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_TEXT_MODEL,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "COMICGEN_DEBUG")]
    /// Enable debug logging. Env: COMICGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "COMICGEN_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: COMICGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "COMICGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: COMICGEN_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(flatten)]
    /// Upstream model provider settings.
    pub provider: ProviderOptions,

    #[clap(long, short, env = "COMICGEN_STATIC_DIR")]
    /// Directory holding the frontend bundle, served at `/` when set.
    /// Env: COMICGEN_STATIC_DIR
    pub static_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
/// Settings for the chat-completion and image-generation provider.
pub struct ProviderOptions {
    /// OpenAI API key. Without it every generation request fails.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// API base URL, eg `https://api.openai.com/v1`.
    #[arg(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "COMICGEN_OPENAI_BASE_URL")]
    pub openai_base_url: String,

    /// Text model used to build the story structure
    #[arg(long, default_value = DEFAULT_TEXT_MODEL, env = "COMICGEN_TEXT_MODEL")]
    pub text_model: String,

    /// Image model used to draw the page
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL, env = "COMICGEN_IMAGE_MODEL")]
    pub image_model: String,

    /// Attempts made when the image provider rate limits us
    #[arg(
        long,
        default_value_t = DEFAULT_IMAGE_RETRY_ATTEMPTS,
        env = "COMICGEN_IMAGE_RETRY_ATTEMPTS"
    )]
    pub image_retry_attempts: u32,

    /// Pause between rate-limited image attempts, in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_IMAGE_RETRY_DELAY_MS,
        env = "COMICGEN_IMAGE_RETRY_DELAY_MS"
    )]
    pub image_retry_delay_ms: u64,
}
