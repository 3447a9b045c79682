//! Prompt to page: sanitize, structure, compose, draw.

use tracing::{debug, info};

use crate::error::ComicError;
use crate::openai::{GeneratedImage, OpenAiClient};
use crate::prompt::{ArtStyle, compose_scene_prompt};
use crate::sanitizer::sanitize_prompt;
use crate::story::{Story, check_content, parse_story, story_instructions};

/// What the user asked for.
#[derive(Clone, Debug)]
pub struct ComicRequest {
    /// Raw user prompt.
    pub prompt: String,
    /// Drawing style.
    pub style: ArtStyle,
    /// Number of panels, when the caller cares.
    pub panels: Option<usize>,
}

/// Everything produced along the way, for logging and the CLI's debug output.
#[derive(Clone, Debug)]
pub struct ComicPage {
    /// Prompt after the sanitizer ran.
    pub sanitized_prompt: String,
    /// Structured story from the text model.
    pub story: Story,
    /// Prompt sent to the image model.
    pub scene_prompt: String,
    /// The page.
    pub image: GeneratedImage,
}

/// Runs the full generation pipeline for one request. All or nothing: any
/// failure aborts the request and nothing partial is returned.
pub async fn generate_comic(
    client: &OpenAiClient,
    request: &ComicRequest,
) -> Result<ComicPage, ComicError> {
    let sanitized_prompt = sanitize_prompt(&request.prompt);
    if sanitized_prompt.is_empty() {
        return Err(ComicError::BadRequest(
            "Prompt is empty after sanitizing".to_string(),
        ));
    }
    debug!("Sanitized prompt: {sanitized_prompt}");

    let reply = client
        .chat_json(
            &story_instructions(&sanitized_prompt, request.panels),
            &sanitized_prompt,
        )
        .await?;
    let story = parse_story(&reply, request.panels).inspect_err(|err| {
        debug!("Story reply that failed to parse ({err}): {reply}");
    })?;
    check_content(&story)?;

    let scene_prompt = compose_scene_prompt(&story, request.style);
    info!(
        "Requesting {} style page with {} panels and {} characters",
        request.style,
        story.panels.len(),
        story.characters.all_characters.len()
    );
    let image = client.generate_image(&scene_prompt, request.style).await?;

    Ok(ComicPage {
        sanitized_prompt,
        story,
        scene_prompt,
        image,
    })
}
