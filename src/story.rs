//! Structured story produced by the text model, and the repair logic that turns a
//! loosely formatted model reply into one.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// The intermediate representation between a prompt and the image request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Character roster.
    pub characters: CharacterRoster,
    /// Where the story takes place.
    pub setting: Setting,
    /// One description per panel, in reading order.
    pub panels: Vec<PanelDescription>,
}

/// Wrapper object around the character list, as the model emits it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRoster {
    /// Every character that appears anywhere in the story.
    pub all_characters: Vec<Character>,
    /// Fields we don't read but keep.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Visual identity of one character.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Character {
    #[serde(deserialize_with = "lenient_text")]
    /// Short unique visual trait naming the character.
    pub identifier: String,
    #[serde(deserialize_with = "lenient_text")]
    /// Role in the story.
    pub role: String,
    /// Body shape and distinguishing features.
    pub physical_traits: PhysicalTraits,
    /// Face, eyes and hair.
    pub face: Face,
    /// Outfit and accessories.
    pub clothing: Clothing,
    /// Fields we don't read but keep.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body description of a character.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct PhysicalTraits {
    #[serde(deserialize_with = "lenient_text")]
    pub build: String,
    #[serde(deserialize_with = "lenient_text")]
    pub height: String,
    #[serde(deserialize_with = "lenient_text")]
    pub distinguishing_features: String,
}

/// Face description of a character.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct Face {
    #[serde(deserialize_with = "lenient_text")]
    pub shape: String,
    #[serde(deserialize_with = "lenient_text")]
    pub eyes: String,
    #[serde(deserialize_with = "lenient_text")]
    pub hair: String,
    #[serde(deserialize_with = "lenient_text")]
    pub unique_features: String,
}

/// What a character wears.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct Clothing {
    #[serde(deserialize_with = "lenient_text")]
    pub main_outfit: String,
    #[serde(deserialize_with = "lenient_text")]
    pub unique_accessories: String,
}

/// Scene setting shared by all panels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct Setting {
    #[serde(deserialize_with = "lenient_text")]
    pub environment: String,
    #[serde(deserialize_with = "lenient_text")]
    pub time_of_day: String,
    #[serde(deserialize_with = "lenient_text")]
    pub weather: String,
    #[serde(deserialize_with = "lenient_text")]
    pub key_objects: String,
    /// Fields we don't read but keep.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What happens in one panel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelDescription {
    /// Sequence number as the model wrote it (string or number).
    pub panel_number: Value,
    #[serde(deserialize_with = "lenient_text")]
    /// Visual description of the scene.
    pub scene: String,
    #[serde(deserialize_with = "lenient_list")]
    /// Identifiers of the characters in frame.
    pub present_characters: Vec<String>,
    #[serde(deserialize_with = "lenient_actions")]
    /// Character identifier to visible action.
    pub character_actions: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient_text")]
    /// Framing of the shot.
    pub scene_composition: String,
    /// Fields we don't read but keep.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a model reply could not become a [`Story`].
#[derive(Debug)]
pub enum StoryError {
    /// No balanced `{ ... }` block in the reply.
    NoJsonObject,
    /// A JSON object was found but did not parse.
    InvalidJson(serde_json::Error),
    /// Required keys are missing or have the wrong shape.
    InvalidStructure(String),
    /// More panels were requested but the model returned none to copy.
    NoPanels,
    /// A panel description contains forbidden terms.
    InappropriateContent,
}

impl std::fmt::Display for StoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoJsonObject => {
                write!(f, "Failed to parse story structure: No JSON object found in content")
            }
            Self::InvalidJson(err) => write!(f, "Failed to parse story structure: {err}"),
            Self::InvalidStructure(detail) => {
                write!(f, "Failed to parse story structure: Invalid JSON structure ({detail})")
            }
            Self::NoPanels => write!(f, "Failed to parse story structure: no panels returned"),
            Self::InappropriateContent => write!(f, "Story contains inappropriate content"),
        }
    }
}

impl std::error::Error for StoryError {}

#[allow(clippy::expect_used)]
static FORBIDDEN_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(nsfw|explicit|adult|graphic|gore|blood|violent|weapon|kill|die|dead|wound|injury|hurt|harm|cruel|brutal|savage|vicious)\b",
    )
    .expect("forbidden terms regex")
});

/// System instruction describing the JSON the model must return.
pub fn story_instructions(prompt: &str, panels: Option<usize>) -> String {
    let panel_rule = match panels {
        Some(count) => format!("7. Produce exactly {count} panels\n"),
        None => String::new(),
    };
    format!(
        r#"You are a visual storytelling expert. Convert the user's story into purely visual sequential scenes.
Return your response as a JSON object with the structure below.

RULES:
1. No text or dialogue of any kind
2. Each panel is one clear, distinct scene
3. Characters are visually distinguishable from each other
4. Each character keeps exactly the same appearance in every panel
5. The story follows a logical visual progression
6. The environment stays consistent within the same location
{panel_rule}
REQUIRED JSON STRUCTURE:
{{
  "characters": {{
    "allCharacters": [
      {{
        "identifier": "unique visual trait that names this character",
        "role": "role in the story",
        "physicalTraits": {{
          "build": "body type",
          "height": "relative to the other characters",
          "distinguishingFeatures": "unique visual elements"
        }},
        "face": {{
          "shape": "face shape",
          "eyes": "eye characteristics",
          "hair": "hairstyle and color",
          "uniqueFeatures": "distinguishing facial features"
        }},
        "clothing": {{
          "mainOutfit": "outfit description",
          "uniqueAccessories": "character-specific items"
        }}
      }}
    ]
  }},
  "setting": {{
    "environment": "detailed scene description",
    "timeOfDay": "lighting condition",
    "weather": "atmospheric conditions",
    "keyObjects": "important scene elements"
  }},
  "panels": [
    {{
      "panelNumber": 1,
      "scene": "clear visual description",
      "presentCharacters": ["identifiers of characters in frame"],
      "characterActions": {{
        "characterIdentifier": "visible action"
      }},
      "sceneComposition": "how the shot is framed"
    }}
  ]
}}

USER PROMPT: "{prompt}"
Return only the JSON object describing a visual narrative without any text or dialogue."#
    )
}

/// Parses a model reply into a [`Story`], repairing what can be repaired.
///
/// Markdown fences are stripped, the first JSON object is located by brace
/// matching, required keys are checked and, when `expected_panels` is set,
/// the panel list is padded or truncated to that length.
pub fn parse_story(content: &str, expected_panels: Option<usize>) -> Result<Story, StoryError> {
    let cleaned = strip_code_fences(content);
    let value = extract_json_object(&cleaned)?;
    validate_structure(&value)?;

    let mut story: Story = serde_json::from_value(value)
        .map_err(|err| StoryError::InvalidStructure(err.to_string()))?;

    if let Some(expected) = expected_panels {
        reconcile_panel_count(&mut story.panels, expected)?;
    }
    Ok(story)
}

/// Removes markdown code fences the model sometimes wraps its JSON in.
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Returns the byte range of the first balanced `{ ... }` block starting at or
/// after `from`. Braces inside JSON strings are ignored.
fn balanced_object(text: &str, from: usize) -> Option<(usize, usize)> {
    let start = from + text.get(from..)?.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds the first balanced object in `text` that parses as JSON.
pub fn extract_json_object(text: &str) -> Result<Value, StoryError> {
    let mut from = 0;
    let mut last_error = None;
    while let Some((start, end)) = balanced_object(text, from) {
        match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!("Skipping unparseable JSON candidate at byte {start}: {err}");
                last_error = Some(err);
                from = start + 1;
            }
        }
    }
    Err(last_error.map_or(StoryError::NoJsonObject, StoryError::InvalidJson))
}

fn validate_structure(value: &Value) -> Result<(), StoryError> {
    if !value
        .pointer("/characters/allCharacters")
        .is_some_and(Value::is_array)
    {
        return Err(StoryError::InvalidStructure(
            "characters.allCharacters must be a list".to_string(),
        ));
    }
    if !value.get("setting").is_some_and(Value::is_object) {
        return Err(StoryError::InvalidStructure(
            "setting must be an object".to_string(),
        ));
    }
    if !value.get("panels").is_some_and(Value::is_array) {
        return Err(StoryError::InvalidStructure(
            "panels must be a list".to_string(),
        ));
    }
    Ok(())
}

/// Pads (by repeating the last panel, renumbered) or truncates `panels` to `expected`.
pub fn reconcile_panel_count(
    panels: &mut Vec<PanelDescription>,
    expected: usize,
) -> Result<(), StoryError> {
    if panels.len() >= expected {
        if panels.len() > expected {
            warn!(
                "Model returned {} panels, expected {}; truncating",
                panels.len(),
                expected
            );
            panels.truncate(expected);
        }
        return Ok(());
    }

    let Some(last) = panels.last().cloned() else {
        return Err(StoryError::NoPanels);
    };
    warn!(
        "Model returned {} panels, expected {}; repeating the last panel",
        panels.len(),
        expected
    );
    while panels.len() < expected {
        let mut copy = last.clone();
        copy.panel_number = Value::from(panels.len() + 1);
        panels.push(copy);
    }
    Ok(())
}

/// Rejects stories whose panel descriptions still contain forbidden terms.
pub fn check_content(story: &Story) -> Result<(), StoryError> {
    let flagged = story.panels.iter().any(|panel| {
        FORBIDDEN_TERMS.is_match(&panel.scene)
            || panel
                .extra
                .get("description")
                .is_some_and(|description| FORBIDDEN_TERMS.is_match(&value_text(description)))
    });
    if flagged {
        return Err(StoryError::InappropriateContent);
    }
    Ok(())
}

/// Renders any JSON value as prompt text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| value_text(&value))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value_text).collect(),
        other => vec![value_text(&other)],
    })
}

fn lenient_actions<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(who, action)| (who, value_text(&action)))
            .collect(),
        _ => BTreeMap::new(),
    })
}
