//! The input contract (§3) and the small tagged-variant vocabularies that
//! replace the source's open-ended string typing (§9 "extensive runtime
//! typing" re-architecture note).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::duration::DurationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    New,
    Extend,
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Energy {
    Low,
    Medium,
    High,
}

impl Energy {
    /// Signed bias in [-0.15, 0.15] used to modulate section energy/density
    /// targets, per §4.5.
    pub fn bias(self) -> f32 {
        match self {
            Energy::Low => -0.15,
            Energy::Medium => 0.0,
            Energy::High => 0.15,
        }
    }
}

/// Pitch class of the root note, C..B. Ordered as in scientific pitch
/// notation with sharps; flats are normalized to the enharmonic sharp on
/// parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(s: u8) -> Self {
        const ORDER: [PitchClass; 12] = [
            PitchClass::C,
            PitchClass::CSharp,
            PitchClass::D,
            PitchClass::DSharp,
            PitchClass::E,
            PitchClass::F,
            PitchClass::FSharp,
            PitchClass::G,
            PitchClass::GSharp,
            PitchClass::A,
            PitchClass::ASharp,
            PitchClass::B,
        ];
        ORDER[(s % 12) as usize]
    }
}

impl FromStr for PitchClass {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(|| "empty root note".to_string())?;
        let base: i32 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(format!("unknown pitch letter: {letter}")),
        };
        let mut pc = base;
        if let Some(acc) = chars.next() {
            match acc {
                '#' | '♯' => pc += 1,
                'b' | '♭' => pc -= 1,
                _ => return Err(format!("unknown accidental: {acc}")),
            }
        }
        Ok(PitchClass::from_semitone(pc.rem_euclid(12) as u8))
    }
}

/// Genres recognized by the knowledge base (§4.4, §6). Unrecognized input
/// collapses to `Other`, which degrades to pop-like rule-based defaults per
/// §3/§8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Pop,
    Rock,
    Jazz,
    Classical,
    Electronic,
    Lofi,
    Ambient,
    Cinematic,
    Funk,
    Rnb,
    Other,
}

impl Genre {
    pub fn all() -> &'static [Genre] {
        &[
            Genre::Pop,
            Genre::Rock,
            Genre::Jazz,
            Genre::Classical,
            Genre::Electronic,
            Genre::Lofi,
            Genre::Ambient,
            Genre::Cinematic,
            Genre::Funk,
            Genre::Rnb,
        ]
    }

    pub fn slug(self) -> &'static str {
        match self {
            Genre::Pop => "pop",
            Genre::Rock => "rock",
            Genre::Jazz => "jazz",
            Genre::Classical => "classical",
            Genre::Electronic => "electronic",
            Genre::Lofi => "lofi",
            Genre::Ambient => "ambient",
            Genre::Cinematic => "cinematic",
            Genre::Funk => "funk",
            Genre::Rnb => "rnb",
            Genre::Other => "other",
        }
    }
}

impl FromStr for Genre {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "pop" => Genre::Pop,
            "rock" => Genre::Rock,
            "jazz" => Genre::Jazz,
            "classical" => Genre::Classical,
            "electronic" | "edm" => Genre::Electronic,
            "lofi" | "lo-fi" => Genre::Lofi,
            "ambient" => Genre::Ambient,
            "cinematic" | "film" | "score" => Genre::Cinematic,
            "funk" | "funky" => Genre::Funk,
            "rnb" | "r&b" => Genre::Rnb,
            _ => Genre::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emotion {
    Peaceful,
    Epic,
    Sad,
    Happy,
    Energetic,
    Mysterious,
    Triumphant,
    Melancholic,
    Other,
}

impl FromStr for Emotion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "peaceful" | "calm" => Emotion::Peaceful,
            "epic" | "grand" => Emotion::Epic,
            "sad" => Emotion::Sad,
            "happy" | "joyful" => Emotion::Happy,
            "energetic" | "upbeat" => Emotion::Energetic,
            "mysterious" | "eerie" => Emotion::Mysterious,
            "triumphant" | "victorious" => Emotion::Triumphant,
            "melancholic" | "melancholy" | "wistful" => Emotion::Melancholic,
            _ => Emotion::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StyleDescriptor {
    Ambient,
    Cinematic,
    Funky,
    Minimal,
    Ethereal,
    Orchestral,
    Rhythmic,
    Other,
}

impl FromStr for StyleDescriptor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "ambient" => StyleDescriptor::Ambient,
            "cinematic" => StyleDescriptor::Cinematic,
            "funky" | "funk" => StyleDescriptor::Funky,
            "minimal" | "minimalist" => StyleDescriptor::Minimal,
            "ethereal" | "dreamy" => StyleDescriptor::Ethereal,
            "orchestral" => StyleDescriptor::Orchestral,
            "rhythmic" | "groovy" => StyleDescriptor::Rhythmic,
            _ => StyleDescriptor::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackType {
    Lead,
    CounterMelody,
    Harmony,
    Bass,
    Drums,
    Arpeggio,
    Pad,
    Fx,
}

impl TrackType {
    pub fn slug(self) -> &'static str {
        match self {
            TrackType::Lead => "lead",
            TrackType::CounterMelody => "counter_melody",
            TrackType::Harmony => "harmony",
            TrackType::Bass => "bass",
            TrackType::Drums => "drums",
            TrackType::Arpeggio => "arpeggio",
            TrackType::Pad => "pad",
            TrackType::Fx => "fx",
        }
    }

    /// Padding order used by the track planner (§4.6 step 3) when a
    /// requested track count exceeds the default set.
    pub fn padding_order() -> &'static [TrackType] {
        &[
            TrackType::CounterMelody,
            TrackType::Arpeggio,
            TrackType::Pad,
            TrackType::Fx,
        ]
    }
}

/// The input contract consumed by the composition core (§3, §6).
///
/// Every field has either a concrete value or is explicitly `None` /
/// `Option` — there is no partial/undefined state beyond what `Option`
/// already expresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub genre: Genre,
    pub mode: Mode,
    pub scale_name: Option<String>,
    pub root: PitchClass,
    pub requested_tempo: Option<u32>,
    pub energy: Energy,
    pub emotions: BTreeSet<Emotion>,
    pub styles: BTreeSet<StyleDescriptor>,
    pub cultural_style: Option<String>,
    pub requested_track_count: Option<u32>,
    pub explicit_instruments: Option<Vec<String>>,
    pub duration: DurationRequest,
}

impl Intent {
    /// A reasonable baseline intent; callers override fields as needed.
    /// Mirrors the "empty emotion/style sets -> default profile" boundary
    /// behavior in §8.
    pub fn default_for(genre: Genre) -> Self {
        Intent {
            action: Action::New,
            genre,
            mode: Mode::Major,
            scale_name: None,
            root: PitchClass::C,
            requested_tempo: None,
            energy: Energy::Medium,
            emotions: BTreeSet::new(),
            styles: BTreeSet::new(),
            cultural_style: None,
            requested_track_count: None,
            explicit_instruments: None,
            duration: DurationRequest::default(),
        }
    }
}
