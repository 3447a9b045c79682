//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;

use crate::cli::ProviderOptions;

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
            .with_module_level("usvg", LevelFilter::Warn)
            .with_module_level("fontdb", LevelFilter::Warn)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Resolved settings for talking to the model provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Bearer token; `None` makes every provider call fail.
    pub api_key: Option<String>,
    /// API base URL without a trailing slash.
    pub base_url: String,
    /// Chat-completion model.
    pub text_model: String,
    /// Image-generation model.
    pub image_model: String,
    /// Total attempts for a rate-limited image request, at least one.
    pub image_retry_attempts: u32,
    /// Fixed pause between rate-limited attempts.
    pub image_retry_delay: Duration,
}

impl ProviderConfig {
    /// Endpoint URL for `path` under the configured base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl From<ProviderOptions> for ProviderConfig {
    fn from(options: ProviderOptions) -> Self {
        Self {
            api_key: options
                .openai_api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            base_url: options.openai_base_url.trim_end_matches('/').to_string(),
            text_model: options.text_model,
            image_model: options.image_model,
            image_retry_attempts: options.image_retry_attempts.max(1),
            image_retry_delay: Duration::from_millis(options.image_retry_delay_ms),
        }
    }
}
