//! HTTP endpoints and server startup.

use std::num::NonZeroU16;
use std::path::Path;

use axum::Router;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::openai::OpenAiClient;
use crate::overlay::Compositor;

mod capture;
mod extract;
mod generate;
mod prelude;

use capture::{capture_handler, download_handler};
use generate::generate_handler;

/// Shared, read-only state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    openai: OpenAiClient,
    http: reqwest::Client,
    compositor: Compositor,
}

impl AppState {
    /// `http` is used for fetching panel images; the provider client keeps its own.
    pub fn new(openai: OpenAiClient, http: reqwest::Client, compositor: Compositor) -> Self {
        Self {
            openai,
            http,
            compositor,
        }
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}

fn create_router(static_dir: Option<&Path>) -> Router<AppState> {
    let router = Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/capture", post(capture_handler))
        .route("/api/download", post(download_handler))
        .route("/healthz", get(healthz_handler));

    match static_dir {
        Some(dir) => {
            info!("Serving frontend from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Binds `listen_addr:port` and serves until interrupted.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState,
    static_dir: Option<&Path>,
) -> Result<(), anyhow::Error> {
    let app = create_router(static_dir).with_state(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::body::Body;
    use axum::extract::State;
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::Json;
    use http_body_util::BodyExt;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use usvg::fontdb;

    use crate::config::ProviderConfig;

    /// How the fake provider should answer image requests.
    #[derive(Clone, Copy)]
    enum ImageMode {
        Ok,
        RateLimited,
    }

    #[derive(Clone)]
    struct Mock {
        image_mode: ImageMode,
        image_calls: Arc<AtomicUsize>,
        addr: SocketAddr,
    }

    fn story_reply(panels: usize) -> String {
        let panels: Vec<Value> = (1..=panels)
            .map(|n| {
                json!({
                    "panelNumber": n,
                    "scene": format!("the cat naps, part {n}"),
                    "presentCharacters": ["orange cat"],
                    "characterActions": {"orange cat": "sleeps"},
                    "sceneComposition": "close-up"
                })
            })
            .collect();
        json!({
            "characters": {"allCharacters": [{"identifier": "orange cat", "role": "hero"}]},
            "setting": {"environment": "sunny window", "timeOfDay": "noon"},
            "panels": panels
        })
        .to_string()
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 120, 10, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    async fn mock_chat(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["response_format"]["type"], "json_object");
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": story_reply(2)}}]
        }))
    }

    async fn mock_images(State(mock): State<Mock>) -> axum::response::Response {
        mock.image_calls.fetch_add(1, Ordering::SeqCst);
        match mock.image_mode {
            ImageMode::Ok => Json(json!({
                "data": [{"url": format!("http://{}/files/page.png", mock.addr), "revised_prompt": "a cat"}]
            }))
            .into_response(),
            ImageMode::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"message": "Rate limit reached"}})),
            )
                .into_response(),
        }
    }

    async fn mock_file() -> impl IntoResponse {
        ([(CONTENT_TYPE, "image/png")], png_bytes())
    }

    /// Starts a fake provider on an ephemeral port.
    async fn start_mock(image_mode: ImageMode) -> Mock {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock");
        let mock = Mock {
            image_mode,
            image_calls: Arc::new(AtomicUsize::new(0)),
            addr: listener.local_addr().expect("mock addr"),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(mock_chat))
            .route("/v1/images/generations", post(mock_images))
            .route("/files/page.png", get(mock_file))
            .with_state(mock.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        mock
    }

    fn state_for(mock: &Mock) -> AppState {
        let http = reqwest::Client::new();
        let config = ProviderConfig {
            api_key: Some("sk-test".to_string()),
            base_url: format!("http://{}/v1", mock.addr),
            text_model: "gpt-3.5-turbo".to_string(),
            image_model: "dall-e-3".to_string(),
            image_retry_attempts: 2,
            image_retry_delay: Duration::from_millis(1),
        };
        AppState::new(
            OpenAiClient::new(http.clone(), config),
            http,
            Compositor::new(Arc::new(fontdb::Database::new()), 64),
        )
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let mock = start_mock(ImageMode::Ok).await;
        let app = create_router(None).with_state(state_for(&mock));
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn generate_returns_single_multi_panel_image() {
        let mock = start_mock(ImageMode::Ok).await;
        let app = create_router(None).with_state(state_for(&mock));

        let response = app
            .oneshot(post_json(
                "/api/generate",
                &json!({"prompt": "a cat fights a dog", "style": "comic", "panels": 3}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["images"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["images"][0]["id"], "multi-panel");
        assert_eq!(
            body["images"][0]["url"],
            format!("http://{}/files/page.png", mock.addr)
        );
        assert_eq!(mock.image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generate_rejects_bad_input_without_calling_provider() {
        let mock = start_mock(ImageMode::Ok).await;
        let app = create_router(None).with_state(state_for(&mock));

        for body in [
            json!({"prompt": "", "style": "manga"}),
            json!({"prompt": "cats", "panels": 0}),
            json!({"prompt": "cats", "panels": 9}),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/api/generate", &body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert!(read_json(response).await["error"].is_string());
        }

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/generate")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mock.image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rate_limit_is_retried_then_mirrored() {
        let mock = start_mock(ImageMode::RateLimited).await;
        let app = create_router(None).with_state(state_for(&mock));

        let response = app
            .oneshot(post_json("/api/generate", &json!({"prompt": "a cat"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(read_json(response).await["error"], "Rate limit reached");
        assert_eq!(mock.image_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_api_key_is_500() {
        let mock = start_mock(ImageMode::Ok).await;
        let mut state = state_for(&mock);
        let mut config = state.openai.config().clone();
        config.api_key = None;
        state.openai = OpenAiClient::new(reqwest::Client::new(), config);
        let app = create_router(None).with_state(state);

        let response = app
            .oneshot(post_json("/api/generate", &json!({"prompt": "a cat"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn capture_returns_png_attachment() {
        let mock = start_mock(ImageMode::Ok).await;
        let app = create_router(None).with_state(state_for(&mock));

        let response = app
            .oneshot(post_json(
                "/api/capture",
                &json!({
                    "imageUrl": format!("http://{}/files/page.png", mock.addr),
                    "dialogues": [{"text": "Hi!", "style": "normal", "type": "dialogue", "position": {"x": 50, "y": 50}}],
                    "thoughts": []
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"panel.png\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let decoded = image::load_from_memory(&bytes).expect("png");
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[tokio::test]
    async fn capture_failure_has_fixed_message() {
        let mock = start_mock(ImageMode::Ok).await;
        let app = create_router(None).with_state(state_for(&mock));

        let response = app
            .oneshot(post_json(
                "/api/capture",
                &json!({"imageUrl": format!("http://{}/missing.png", mock.addr)}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await["error"], "Failed to capture panel");
    }

    #[tokio::test]
    async fn download_passes_bytes_through() {
        let mock = start_mock(ImageMode::Ok).await;
        let app = create_router(None).with_state(state_for(&mock));

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/download",
                &json!({"url": format!("http://{}/files/page.png", mock.addr)}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"panel.png\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.to_vec(), png_bytes());

        let response = app
            .oneshot(post_json("/api/download", &json!({"url": "ftp://nope"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await["error"], "Failed to download image");
    }

    #[tokio::test]
    async fn static_dir_is_served_as_fallback() {
        let mock = start_mock(ImageMode::Ok).await;
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<h1>comics</h1>").expect("write index");
        let app = create_router(Some(dir.path())).with_state(state_for(&mock));

        let request = Request::builder()
            .uri("/index.html")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<h1>comics</h1>");
    }
}
