//! Shared constants/setters for things
//!

use std::sync::LazyLock;

/// Default OpenAI API base, overridable for proxies and tests.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used to expand a prompt into a story structure.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-3.5-turbo";

/// Model used to draw the comic page.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Sampling temperature for the story request.
pub const STORY_TEMPERATURE: f32 = 0.7;

/// Size of the generated page, and of the capture canvas.
pub const IMAGE_SIZE: &str = "1024x1024";

/// Side length in pixels of the square capture canvas.
pub const CANVAS_SIZE: u32 = 1024;

/// How many times an image request is attempted when the provider rate limits us.
pub const DEFAULT_IMAGE_RETRY_ATTEMPTS: u32 = 3;

/// Fixed pause between rate-limited image attempts.
pub const DEFAULT_IMAGE_RETRY_DELAY_MS: u64 = 2000;

/// Upper bound on panels per generation request.
pub const MAX_PANELS: usize = 8;

/// Identifier of the single composited page returned by `generate`.
pub const MULTI_PANEL_IMAGE_ID: &str = "multi-panel";

/// Filename offered for captured and downloaded panels.
pub const PANEL_FILENAME: &str = "panel.png";

/// Filename offered when saving the whole grid client-side.
pub const GRID_FILENAME: &str = "comic-grid.png";

/// Content-Disposition value for panel downloads.
pub static PANEL_CONTENT_DISPOSITION: LazyLock<String> =
    LazyLock::new(|| format!("attachment; filename=\"{}\"", PANEL_FILENAME));

/// Placeholder text for a freshly added dialogue bubble.
pub const NEW_DIALOGUE_TEXT: &str = "New dialogue";

/// Placeholder text for a freshly added thought bubble.
pub const NEW_THOUGHT_TEXT: &str = "New thought";
