//! JSON bodies exchanged between the browser and the HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::model::{Bubble, Panel};
use crate::prompt::ArtStyle;

/// `POST /api/generate` request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// What the comic is about.
    pub prompt: String,
    /// Drawing style.
    #[serde(default)]
    pub style: ArtStyle,
    /// Requested panel count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panels: Option<usize>,
}

/// One generated image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPanel {
    /// Stable identifier of the image.
    pub id: String,
    /// Where the image can be fetched.
    pub url: String,
}

/// `POST /api/generate` success response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Always a single composited page.
    pub images: Vec<GeneratedPanel>,
}

impl GenerateResponse {
    /// Fresh editor panels, one per image, without bubbles.
    pub fn into_panels(self) -> Vec<Panel> {
        self.images
            .into_iter()
            .map(|image| Panel::new(image.id, image.url))
            .collect()
    }
}

/// `POST /api/capture` request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    /// Source image.
    pub image_url: String,
    /// Dialogue bubbles to draw.
    #[serde(default)]
    pub dialogues: Vec<Bubble>,
    /// Thought bubbles to draw.
    #[serde(default)]
    pub thoughts: Vec<Bubble>,
}

impl From<&Panel> for CaptureRequest {
    fn from(panel: &Panel) -> Self {
        Self {
            image_url: panel.image_url.clone(),
            dialogues: panel.dialogues.clone(),
            thoughts: panel.thoughts.clone(),
        }
    }
}

/// `POST /api/download` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Remote image to proxy.
    pub url: String,
}

/// Error body returned by every endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
}
