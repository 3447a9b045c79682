use axum::body::Body;
use axum::http::header::CONTENT_DISPOSITION;

use super::prelude::*;
use crate::api::{CaptureRequest, DownloadRequest};
use crate::constants::PANEL_CONTENT_DISPOSITION;
use crate::fetch::fetch_image_bytes;

/// PNG attachment response used by both capture and download.
fn png_attachment(bytes: Vec<u8>) -> Result<Response, ComicError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "image/png")
        .header(CONTENT_DISPOSITION, PANEL_CONTENT_DISPOSITION.as_str())
        .body(Body::from(bytes))
        .map_err(ComicError::from)
}

/// `POST /api/capture`: draws the bubbles onto the panel image server-side.
pub(crate) async fn capture_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CaptureRequest>,
) -> Result<Response, ComicError> {
    let CaptureRequest {
        image_url,
        dialogues,
        thoughts,
    } = request;
    debug!(
        "Capturing panel with {} dialogues and {} thoughts",
        dialogues.len(),
        thoughts.len()
    );

    let source = fetch_image_bytes(&state.http, &image_url)
        .await
        .map_err(|err| ComicError::CaptureFailed(err.to_string()))?;

    let compositor = state.compositor.clone();
    let png = tokio::task::spawn_blocking(move || {
        compositor.compose_png(&source, &dialogues, &thoughts)
    })
    .await
    .map_err(|err| ComicError::CaptureFailed(err.to_string()))??;

    png_attachment(png)
}

/// `POST /api/download`: proxies a remote image so the browser can save it.
pub(crate) async fn download_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DownloadRequest>,
) -> Result<Response, ComicError> {
    let bytes = fetch_image_bytes(&state.http, &request.url).await?;
    info!("Proxied {} byte image download", bytes.len());
    png_attachment(bytes)
}
