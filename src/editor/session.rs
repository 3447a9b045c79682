//! Tracks the one generation request the page may have in flight.

use tracing::{debug, warn};

use super::Editor;
use crate::api::{GenerateRequest, GenerateResponse};
use crate::prompt::ArtStyle;

/// Why a generation could not start.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionError {
    /// The prompt is blank.
    EmptyPrompt,
    /// A request is already running.
    AlreadyGenerating,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPrompt => f.write_str("Please enter a prompt"),
            Self::AlreadyGenerating => f.write_str("A comic is already being generated"),
        }
    }
}

impl std::error::Error for SessionError {}

/// In-flight flag and last error of the generate form.
#[derive(Clone, Debug, Default)]
pub struct Session {
    generating: bool,
    error: Option<String>,
}

impl Session {
    /// Idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a request is in flight; the generate control is disabled.
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Error from the last request, shown inline.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Starts a request, returning the body to send.
    pub fn begin(
        &mut self,
        prompt: &str,
        style: ArtStyle,
        panels: Option<usize>,
    ) -> Result<GenerateRequest, SessionError> {
        if self.generating {
            return Err(SessionError::AlreadyGenerating);
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        self.generating = true;
        self.error = None;
        debug!("Generating {style} comic");
        Ok(GenerateRequest {
            prompt: prompt.to_string(),
            style,
            panels,
        })
    }

    /// Ends the request. Success replaces every panel in `editor` with fresh
    /// ones; failure records the message and leaves `editor` untouched.
    pub fn finish(&mut self, editor: &mut Editor, outcome: Result<GenerateResponse, String>) {
        self.generating = false;
        match outcome {
            Ok(response) => {
                self.error = None;
                editor.replace_panels(response.into_panels());
            }
            Err(message) => {
                warn!("Generation failed: {message}");
                self.error = Some(message);
            }
        }
    }
}
