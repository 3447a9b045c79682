use super::prelude::*;
use crate::api::{GenerateRequest, GenerateResponse, GeneratedPanel};
use crate::constants::{MAX_PANELS, MULTI_PANEL_IMAGE_ID};
use crate::pipeline::{ComicRequest, generate_comic};

/// Checks the request before any provider call is made.
fn validate(request: &GenerateRequest) -> Result<(), ComicError> {
    if request.prompt.trim().is_empty() {
        return Err(ComicError::BadRequest("Prompt is required".to_string()));
    }
    if let Some(panels) = request.panels
        && !(1..=MAX_PANELS).contains(&panels)
    {
        return Err(ComicError::BadRequest(format!(
            "Panel count must be between 1 and {MAX_PANELS}, got {panels}"
        )));
    }
    Ok(())
}

/// `POST /api/generate`
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ComicError> {
    validate(&request)?;
    info!(
        "Generate request: style={} panels={:?}",
        request.style, request.panels
    );

    let page = generate_comic(
        &state.openai,
        &ComicRequest {
            prompt: request.prompt,
            style: request.style,
            panels: request.panels,
        },
    )
    .await?;

    Ok(Json(GenerateResponse {
        images: vec![GeneratedPanel {
            id: MULTI_PANEL_IMAGE_ID.to_string(),
            url: page.image.url,
        }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ArtStyle;

    fn request(prompt: &str, panels: Option<usize>) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.to_string(),
            style: ArtStyle::Manga,
            panels,
        }
    }

    #[test]
    fn panel_count_bounds() {
        assert!(validate(&request("cats", None)).is_ok());
        assert!(validate(&request("cats", Some(1))).is_ok());
        assert!(validate(&request("cats", Some(MAX_PANELS))).is_ok());
        assert!(validate(&request("cats", Some(0))).is_err());
        assert!(validate(&request("cats", Some(MAX_PANELS + 1))).is_err());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = validate(&request(" \n\t", None)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
