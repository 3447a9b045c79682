//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, info, warn};

use crate::fetch::FetchError;
use crate::openai::ProviderError;
use crate::overlay::OverlayError;
use crate::story::StoryError;

/// definitions for the comicgen application.
///
/// Every variant renders as `{ "error": "..." }` JSON.
#[derive(Debug)]
pub enum ComicError {
    /// When you didn't do the right thing
    BadRequest(String),
    /// The model provider failed; carries its HTTP status when it sent one.
    Upstream {
        /// Status returned by the provider, if any.
        status: Option<u16>,
        /// Message shown to the caller.
        message: String,
    },
    /// The model's story output could not be parsed or repaired
    StoryStructure(String),
    /// The generated story tripped the content filter
    ContentRejected(String),
    /// Flattening bubbles onto the panel failed
    CaptureFailed(String),
    /// Proxying a remote image failed
    DownloadFailed(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl ComicError {
    /// HTTP status used for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ComicError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ComicError::Upstream { status, .. } => status
                .and_then(|status| StatusCode::from_u16(status).ok())
                .filter(|status| status.is_client_error() || status.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ComicError::ContentRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ComicError::StoryStructure(_)
            | ComicError::CaptureFailed(_)
            | ComicError::DownloadFailed(_)
            | ComicError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the JSON body.
    pub fn public_message(&self) -> String {
        match self {
            ComicError::BadRequest(message)
            | ComicError::Upstream { message, .. }
            | ComicError::StoryStructure(message)
            | ComicError::ContentRejected(message) => message.clone(),
            ComicError::CaptureFailed(_) => "Failed to capture panel".to_string(),
            ComicError::DownloadFailed(_) => "Failed to download image".to_string(),
            ComicError::InternalServerError(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for ComicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComicError::BadRequest(message) => write!(f, "Bad request: {message}"),
            ComicError::Upstream { status, message } => match status {
                Some(status) => write!(f, "Provider error {status}: {message}"),
                None => write!(f, "Provider error: {message}"),
            },
            ComicError::StoryStructure(message) => f.write_str(message),
            ComicError::ContentRejected(message) => write!(f, "Content rejected: {message}"),
            ComicError::CaptureFailed(message) => write!(f, "Capture failed: {message}"),
            ComicError::DownloadFailed(message) => write!(f, "Download failed: {message}"),
            ComicError::InternalServerError(message) => {
                write!(f, "Internal server error: {message}")
            }
        }
    }
}

impl std::error::Error for ComicError {}

impl From<ProviderError> for ComicError {
    fn from(err: ProviderError) -> Self {
        ComicError::Upstream {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<StoryError> for ComicError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::InappropriateContent => ComicError::ContentRejected(err.to_string()),
            other => ComicError::StoryStructure(other.to_string()),
        }
    }
}

impl From<OverlayError> for ComicError {
    fn from(err: OverlayError) -> Self {
        ComicError::CaptureFailed(err.to_string())
    }
}

impl From<FetchError> for ComicError {
    fn from(err: FetchError) -> Self {
        ComicError::DownloadFailed(err.to_string())
    }
}

impl From<std::io::Error> for ComicError {
    fn from(err: std::io::Error) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ComicError {
    fn from(err: axum::http::Error) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for ComicError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match &self {
            ComicError::BadRequest(_) => info!("Bad request received: {}", self),
            ComicError::ContentRejected(_) => warn!("{}", self),
            _ => error!("{}", self),
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
