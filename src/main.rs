use clap::Parser;
use comicgen::config::{ProviderConfig, setup_logging};
use comicgen::constants::CANVAS_SIZE;
use comicgen::openai::OpenAiClient;
use comicgen::overlay::Compositor;
use comicgen::web::AppState;
use tracing::{error, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = comicgen::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = ProviderConfig::from(cli.provider);
    if config.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, generation requests will fail");
    }

    let http = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build HTTP client: {}", err);
            return;
        }
    };

    let compositor = match tokio::task::spawn_blocking(|| Compositor::with_system_fonts(CANVAS_SIZE)).await {
        Ok(compositor) => compositor,
        Err(err) => {
            error!("Failed to load fonts: {}", err);
            return;
        }
    };

    let state = AppState::new(OpenAiClient::new(http.clone(), config), http, compositor);

    if let Err(err) = comicgen::web::setup_server(
        &cli.listen_address,
        cli.port,
        state,
        cli.static_dir.as_deref(),
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
