//! Panel and bubble records shared by the editor, the overlay engine and the HTTP API.

use serde::{Deserialize, Serialize};

use crate::constants::{NEW_DIALOGUE_TEXT, NEW_THOUGHT_TEXT};

/// Clamps a percentage coordinate into `[0, 100]`.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Bubble anchor as a percentage of the panel's width and height.
///
/// Both components are always within `[0, 100]`, including after deserializing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPosition")]
pub struct Position {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct RawPosition {
    x: f64,
    y: f64,
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Position::new(raw.x, raw.y)
    }
}

impl Position {
    /// Middle of the panel, where new bubbles appear.
    pub const CENTER: Position = Position { x: 50.0, y: 50.0 };

    /// Creates a position, clamping both components.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Horizontal percentage.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical percentage.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Moves by a percentage delta, clamping the result.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Pixel coordinates on a `width` x `height` surface.
    pub fn to_pixels(&self, width: f64, height: f64) -> (f64, f64) {
        (self.x / 100.0 * width, self.y / 100.0 * height)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Visual treatment of a bubble.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum BubbleStyle {
    #[default]
    Normal,
    Shout,
    Whisper,
    Think,
    Electronic,
    Emphasis,
    Cloud,
    Spiral,
}

/// Which list a bubble belongs to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleKind {
    /// Spoken line, drawn as a rounded box with a tail.
    #[default]
    Dialogue,
    /// Inner thought, drawn as a circle with a trail.
    Thought,
}

/// A dialogue or thought annotation on a panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    /// Text shown in the bubble.
    pub text: String,
    /// Visual treatment.
    #[serde(default)]
    pub style: BubbleStyle,
    /// Dialogue or thought.
    #[serde(rename = "type", default)]
    pub kind: BubbleKind,
    /// Anchor on the panel, in percent.
    #[serde(default)]
    pub position: Position,
    /// Tail indicator angle in degrees; 0 points straight down.
    #[serde(default)]
    pub tail_angle: f64,
}

impl Bubble {
    /// A bubble of `kind` with placeholder text, centered.
    pub fn placeholder(kind: BubbleKind) -> Self {
        let text = match kind {
            BubbleKind::Dialogue => NEW_DIALOGUE_TEXT,
            BubbleKind::Thought => NEW_THOUGHT_TEXT,
        };
        Self {
            text: text.to_string(),
            style: BubbleStyle::Normal,
            kind,
            position: Position::CENTER,
            tail_angle: 0.0,
        }
    }
}

/// One generated image plus the bubbles placed on it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    /// Identifier returned by `generate`.
    pub id: String,
    /// Where the image lives.
    #[serde(alias = "url")]
    pub image_url: String,
    /// Dialogue bubbles, in insertion order.
    #[serde(default)]
    pub dialogues: Vec<Bubble>,
    /// Thought bubbles, in insertion order.
    #[serde(default)]
    pub thoughts: Vec<Bubble>,
}

impl Panel {
    /// A fresh panel without bubbles.
    pub fn new(id: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_url: image_url.into(),
            dialogues: Vec::new(),
            thoughts: Vec::new(),
        }
    }

    /// The list holding bubbles of `kind`.
    pub fn bubbles(&self, kind: BubbleKind) -> &Vec<Bubble> {
        match kind {
            BubbleKind::Dialogue => &self.dialogues,
            BubbleKind::Thought => &self.thoughts,
        }
    }

    /// Mutable access to the list holding bubbles of `kind`.
    pub fn bubbles_mut(&mut self, kind: BubbleKind) -> &mut Vec<Bubble> {
        match kind {
            BubbleKind::Dialogue => &mut self.dialogues,
            BubbleKind::Thought => &mut self.thoughts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positions_are_clamped_on_construction_and_deserialize() {
        let pos = Position::new(-5.0, 140.0);
        assert_eq!((pos.x(), pos.y()), (0.0, 100.0));

        let pos: Position = serde_json::from_value(json!({"x": 250.5, "y": -1})).expect("parse");
        assert_eq!((pos.x(), pos.y()), (100.0, 0.0));
        assert_eq!(Position::new(f64::NAN, 20.0).x(), 0.0);
    }

    #[test]
    fn bubble_defaults_fill_missing_fields() {
        let bubble: Bubble = serde_json::from_value(json!({"text": "Hey"})).expect("parse");
        assert_eq!(bubble.style, BubbleStyle::Normal);
        assert_eq!(bubble.kind, BubbleKind::Dialogue);
        assert_eq!(bubble.position, Position::CENTER);

        let bubble: Bubble = serde_json::from_value(json!({
            "text": "hmm", "style": "cloud", "type": "thought", "position": {"x": 10, "y": 90}
        }))
        .expect("parse");
        assert_eq!(bubble.style, BubbleStyle::Cloud);
        assert_eq!(bubble.kind, BubbleKind::Thought);
        assert_eq!(bubble.position, Position::new(10.0, 90.0));
    }

    #[test]
    fn panel_accepts_generate_response_shape() {
        let panel: Panel =
            serde_json::from_value(json!({"id": "multi-panel", "url": "https://img/x.png"}))
                .expect("parse");
        assert_eq!(panel.image_url, "https://img/x.png");
        assert!(panel.dialogues.is_empty() && panel.thoughts.is_empty());
    }

    #[test]
    fn pixel_scaling_is_linear() {
        assert_eq!(Position::new(50.0, 25.0).to_pixels(1024.0, 1024.0), (512.0, 256.0));
    }
}
