//! Fallback free-text parser (§10.4). CLI glue only — recognizes a duration
//! expression, a genre keyword, and a handful of emotion/style keywords,
//! defaulting everything else. The real natural-language parser is out of
//! scope (spec §1); this exists solely so the CLI binary is runnable
//! without an external LLM in front of it.

use std::str::FromStr;

use crate::duration::DurationRequest;
use crate::intent::{Emotion, Genre, Intent, StyleDescriptor};

/// Parses free text into an `Intent`, layering recognized fields over
/// `Intent::default_for(Genre::Other)`. Never fails — unrecognized text
/// just falls through to defaults, mirroring the genre/emotion enums'
/// own "unknown degrades to Other" behavior.
pub fn parse_text_intent(text: &str) -> Intent {
    let genre = detect_genre(text);
    let mut intent = Intent::default_for(genre);

    if let Some(duration) = crate::duration::parse(text) {
        intent.duration = duration;
    }

    intent.emotions = detect_emotions(text);
    intent.styles = detect_styles(text);
    intent
}

fn detect_genre(text: &str) -> Genre {
    let lower = text.to_ascii_lowercase();
    for &genre in Genre::all() {
        if lower.contains(genre.slug()) {
            return genre;
        }
    }
    // A couple of genre synonyms the slug scan above misses.
    for (needle, genre) in [("edm", Genre::Electronic), ("lo-fi", Genre::Lofi), ("r&b", Genre::Rnb)] {
        if lower.contains(needle) {
            return genre;
        }
    }
    Genre::Other
}

const EMOTION_KEYWORDS: &[&str] = &[
    "peaceful", "calm", "epic", "grand", "sad", "happy", "joyful", "energetic", "upbeat",
    "mysterious", "eerie", "triumphant", "victorious", "melancholic", "melancholy", "wistful",
];

fn detect_emotions(text: &str) -> std::collections::BTreeSet<Emotion> {
    let lower = text.to_ascii_lowercase();
    EMOTION_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .filter_map(|kw| Emotion::from_str(kw).ok())
        .collect()
}

const STYLE_KEYWORDS: &[&str] = &[
    "ambient", "cinematic", "funky", "minimal", "minimalist", "ethereal", "dreamy", "orchestral",
    "rhythmic", "groovy",
];

fn detect_styles(text: &str) -> std::collections::BTreeSet<StyleDescriptor> {
    let lower = text.to_ascii_lowercase();
    STYLE_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .filter_map(|kw| StyleDescriptor::from_str(kw).ok())
        .collect()
}

/// Assembles an `Intent` from the CLI's direct flags, skipping the text
/// scan entirely when the caller already knows the fields.
#[allow(clippy::too_many_arguments)]
pub fn intent_from_flags(
    genre: Option<Genre>,
    minutes: Option<f64>,
    emotion: Option<Emotion>,
    style: Option<StyleDescriptor>,
    track_count: Option<u32>,
) -> Intent {
    let mut intent = Intent::default_for(genre.unwrap_or(Genre::Other));
    if let Some(minutes) = minutes {
        intent.duration = DurationRequest { value: minutes, unit: crate::duration::DurationUnit::Minutes };
    }
    if let Some(emotion) = emotion {
        intent.emotions.insert(emotion);
    }
    if let Some(style) = style {
        intent.styles.insert(style);
    }
    intent.requested_track_count = track_count;
    intent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_genre_and_duration_from_text() {
        let intent = parse_text_intent("an upbeat 2 minute jazz tune");
        assert_eq!(intent.genre, Genre::Jazz);
        assert_eq!(intent.duration.value, 2.0);
        assert!(intent.emotions.contains(&Emotion::Energetic));
    }

    #[test]
    fn unrecognized_text_defaults_to_other() {
        let intent = parse_text_intent("xyzzy plugh");
        assert_eq!(intent.genre, Genre::Other);
        assert!(intent.emotions.is_empty());
    }
}
