use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use super::prelude::*;

/// `Json` extractor whose rejection is rendered as a [`ComicError::BadRequest`],
/// so malformed bodies get the same `{ "error": ... }` shape as everything else.
#[derive(Debug, Clone)]
pub(crate) struct ApiJson<T>(pub(crate) T);

impl<T> FromRequest<AppState> for ApiJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ComicError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> ComicError {
    debug!("Rejected request body: {}", rejection.body_text());
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ComicError::BadRequest("Expected a JSON request body".to_string())
        }
        _ => ComicError::BadRequest(format!("Invalid request body: {}", rejection.body_text())),
    }
}
