pub(crate) use super::extract::ApiJson;
pub(crate) use crate::error::ComicError;
pub(crate) use crate::web::AppState;
pub(crate) use axum::Json;
pub(crate) use axum::extract::State;
pub(crate) use axum::http::{StatusCode, header::CONTENT_TYPE};
pub(crate) use axum::response::Response;
pub(crate) use tracing::{debug, info};
