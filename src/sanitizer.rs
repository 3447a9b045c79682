//! Rewrites user prompts so they are less likely to trip provider content filters.
//!
//! Words from a fixed table are swapped for milder ones, a short list of words is
//! dropped, punctuation runs are collapsed and whitespace is normalized. No value in
//! the table is itself a key, so running the sanitizer twice changes nothing.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Word substitutions applied to lowercased prompts.
pub const SUBSTITUTIONS: &[(&str, &str)] = &[
    // Actions
    ("fight", "dance"),
    ("fights", "dances"),
    ("fought", "danced"),
    ("fighting", "dancing"),
    ("battle", "contest"),
    ("battles", "contests"),
    ("defeat", "win"),
    ("attack", "move"),
    ("hit", "touch"),
    ("strike", "reach"),
    ("kill", "stop"),
    ("kills", "stops"),
    ("killed", "stopped"),
    ("die", "rest"),
    ("dead", "still"),
    ("war", "game"),
    ("weapon", "prop"),
    ("weapons", "props"),
    ("blood", "energy"),
    ("hurt", "touch"),
    ("injury", "moment"),
    ("wound", "mark"),
    ("pain", "feeling"),
    ("violent", "active"),
    ("force", "power"),
    ("destroy", "change"),
    ("crush", "press"),
    ("punch", "wave"),
    ("kick", "jump"),
    ("slash", "swing"),
    ("stab", "point"),
    ("shoot", "aim"),
    ("gun", "stick"),
    ("sword", "staff"),
    ("knife", "tool"),
    ("blade", "edge"),
    ("bomb", "ball"),
    ("explosion", "flash"),
    ("gore", "drama"),
    ("bloody", "intense"),
    ("death", "end"),
    ("murder", "chase"),
    ("assault", "rush"),
    ("victim", "person"),
    ("harm", "reach"),
    ("cruel", "stern"),
    ("brutal", "firm"),
    ("savage", "wild"),
    ("vicious", "quick"),
    // Characters and mood
    ("enemy", "opponent"),
    ("enemies", "opponents"),
    ("rival", "opponent"),
    ("villain", "opponent"),
    ("threat", "challenge"),
    ("danger", "risk"),
    ("scary", "dramatic"),
    ("terrifying", "surprising"),
    ("horror", "mystery"),
    ("evil", "mysterious"),
    ("demon", "spirit"),
    ("monster", "creature"),
];

/// Words removed outright when no substitute fits.
pub const STRIPPED_WORDS: &[&str] = &["nsfw", "explicit", "adult", "graphic"];

static REPLACEMENTS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    SUBSTITUTIONS
        .iter()
        .copied()
        .chain(STRIPPED_WORDS.iter().map(|word| (*word, "")))
        .collect()
});

#[allow(clippy::expect_used)]
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word regex"));

#[allow(clippy::expect_used)]
static PUNCTUATION_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[!?]{2,}").expect("punctuation regex"));

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Returns the milder form of `prompt`. Never fails; may return an empty string.
pub fn sanitize_prompt(prompt: &str) -> String {
    let lowered = prompt.to_lowercase();

    let substituted = WORD.replace_all(&lowered, |caps: &regex::Captures<'_>| {
        let word = &caps[0];
        REPLACEMENTS
            .get(word)
            .map_or_else(|| word.to_string(), |replacement| (*replacement).to_string())
    });
    let collapsed = PUNCTUATION_RUN.replace_all(&substituted, ".");
    let normalized = WHITESPACE_RUN.replace_all(&collapsed, " ");

    capitalize_first(normalized.trim())
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
