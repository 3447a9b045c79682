//! Turns a [`Story`] into the single image prompt sent to the image model.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::story::Story;

/// Drawing style picked by the user.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtStyle {
    /// Black and white, high contrast.
    #[default]
    Manga,
    /// Bold colors.
    Comic,
    /// Natural lighting and lifelike features.
    Realistic,
}

impl ArtStyle {
    /// Style parameter understood by the image provider.
    pub fn provider_style(self) -> &'static str {
        match self {
            ArtStyle::Realistic => "natural",
            ArtStyle::Manga | ArtStyle::Comic => "vivid",
        }
    }

    fn guide(self) -> &'static str {
        match self {
            ArtStyle::Manga => {
                "* Pure black and white art with high contrast
* Distinctive character designs
* Clear visual storytelling
* Dynamic compositions
* Expressive character poses
* Detailed backgrounds
* NO text or speech bubbles"
            }
            ArtStyle::Comic => {
                "* Bold color palette
* Clear character distinctions
* Strong visual narrative
* Dynamic action scenes
* Expressive character poses
* Detailed environments
* NO text or speech bubbles"
            }
            ArtStyle::Realistic => {
                "* Natural lighting and colors
* Realistic character features
* Clear visual storytelling
* Natural compositions
* Lifelike expressions
* Detailed settings
* NO text or speech bubbles"
            }
        }
    }
}

impl std::fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArtStyle::Manga => "manga",
            ArtStyle::Comic => "comic",
            ArtStyle::Realistic => "realistic",
        })
    }
}

impl std::str::FromStr for ArtStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manga" => Ok(ArtStyle::Manga),
            "comic" => Ok(ArtStyle::Comic),
            "realistic" => Ok(ArtStyle::Realistic),
            other => Err(format!("unknown style {other:?}, expected manga, comic or realistic")),
        }
    }
}

const CRITICAL_REQUIREMENTS: &str = "CRITICAL REQUIREMENTS:
1. NO text, speech bubbles, or written elements
2. Each character must be visually distinct
3. Characters must be 100% consistent between panels
4. Each panel must clearly show the story progression
5. Maintain exact same character designs throughout
6. Keep environment consistent within same location
7. Make characters instantly recognizable
8. Do not add any text, letters, symbols or dialogue. No speech bubbles.

IMPORTANT: Pure visual storytelling only - NO text elements of any kind.";

/// Builds the page prompt: style guide, character identities, setting, every
/// panel, then the negative constraints. Bubbles are added afterwards, so the
/// image itself must not contain any lettering.
pub fn compose_scene_prompt(story: &Story, style: ArtStyle) -> String {
    let mut prompt = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(prompt, "Create a {}-panel visual story.", story.panels.len());
    let _ = writeln!(prompt, "\nSTYLE GUIDE:\n{}", style.guide());

    prompt.push_str("\nCHARACTERS (MUST STAY CONSISTENT):\n");
    for character in &story.characters.all_characters {
        let _ = writeln!(
            prompt,
            "Character \"{}\":
- Build: {}
- Appearance: {}
- Face: {}
- Eyes: {}
- Hair: {}
- Outfit: {}
- Accessories: {}
MUST REMAIN 100% IDENTICAL IN ALL APPEARANCES
",
            character.identifier,
            character.physical_traits.build,
            character.physical_traits.distinguishing_features,
            character.face.unique_features,
            character.face.eyes,
            character.face.hair,
            character.clothing.main_outfit,
            character.clothing.unique_accessories,
        );
    }

    let setting = &story.setting;
    let _ = writeln!(
        prompt,
        "SETTING:
- Environment: {}
- Time: {}
- Weather: {}
- Key Elements: {}",
        setting.environment, setting.time_of_day, setting.weather, setting.key_objects
    );

    prompt.push_str("\nSTORY PANELS:\n");
    for (index, panel) in story.panels.iter().enumerate() {
        let actions = panel
            .character_actions
            .iter()
            .map(|(who, action)| format!("{who}: {action}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            prompt,
            "PANEL {}:
Scene: {}
Present: {}
Actions: {}
Composition: {}
NOTE: Characters must be instantly recognizable and identical to other panels
",
            index + 1,
            panel.scene,
            panel.present_characters.join(", "),
            actions,
            panel.scene_composition,
        );
    }

    prompt.push_str(CRITICAL_REQUIREMENTS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::parse_story;
    use serde_json::json;

    fn story() -> Story {
        let raw = json!({
            "characters": {"allCharacters": [
                {"identifier": "the knight", "face": {"hair": "silver braid"}, "clothing": {"mainOutfit": "plate armor"}},
                {"identifier": "the fox", "physicalTraits": {"distinguishingFeatures": "three tails"}}
            ]},
            "setting": {"environment": "snowy pass", "timeOfDay": "dawn"},
            "panels": [
                {"panelNumber": 1, "scene": "the knight climbs", "presentCharacters": ["the knight"],
                 "characterActions": {"the knight": "climbs"}, "sceneComposition": "low angle"},
                {"panelNumber": 2, "scene": "the fox appears", "presentCharacters": ["the knight", "the fox"],
                 "characterActions": {"the fox": "sits", "the knight": "stares"}, "sceneComposition": "two shot"}
            ]
        });
        parse_story(&raw.to_string(), None).expect("parse")
    }

    #[test]
    fn prompt_restates_characters_setting_and_panels() {
        let prompt = compose_scene_prompt(&story(), ArtStyle::Manga);
        assert!(prompt.starts_with("Create a 2-panel visual story."));
        assert!(prompt.contains("Pure black and white"));
        assert!(prompt.contains("Character \"the knight\""));
        assert!(prompt.contains("- Hair: silver braid"));
        assert!(prompt.contains("- Appearance: three tails"));
        assert_eq!(
            prompt.matches("MUST REMAIN 100% IDENTICAL IN ALL APPEARANCES").count(),
            2
        );
        assert!(prompt.contains("- Environment: snowy pass"));
        assert!(prompt.contains("PANEL 2:\nScene: the fox appears"));
        assert!(prompt.contains("Present: the knight, the fox"));
        assert!(prompt.contains("Actions: the fox: sits, the knight: stares"));
    }

    #[test]
    fn prompt_ends_with_negative_constraints() {
        let prompt = compose_scene_prompt(&story(), ArtStyle::Comic);
        assert!(prompt.contains("Bold color palette"));
        assert!(prompt.ends_with("NO text elements of any kind."));
        assert!(prompt.contains("No speech bubbles"));
    }

    #[test]
    fn style_parsing_and_provider_mapping() {
        assert_eq!("Realistic".parse::<ArtStyle>(), Ok(ArtStyle::Realistic));
        assert!("watercolor".parse::<ArtStyle>().is_err());
        assert_eq!(ArtStyle::Realistic.provider_style(), "natural");
        assert_eq!(ArtStyle::Manga.provider_style(), "vivid");
        assert_eq!(ArtStyle::Comic.provider_style(), "vivid");
        let style: ArtStyle = serde_json::from_str("\"comic\"").expect("deserialize");
        assert_eq!(style, ArtStyle::Comic);
    }
}
