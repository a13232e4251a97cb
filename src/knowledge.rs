//! Cultural/Genre Knowledge Base (§4.4): static tables encoding musical
//! conventions. Loaded once, process-wide, read-only — the core never
//! mutates them (§3 ownership note).

use crate::intent::{Emotion, Genre, Mode, StyleDescriptor, TrackType};
use crate::theory::Scale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentFamily {
    Piano,
    Keys,
    Guitar,
    Bass,
    Strings,
    Brass,
    Woodwind,
    SynthLead,
    SynthPad,
    Percussion,
    Drum,
    Fx,
    Ethnic,
}

#[derive(Debug, Clone, Copy)]
pub struct Instrument {
    pub key: &'static str,
    pub program: u8,
    pub family: InstrumentFamily,
    pub versatility: f32,
}

/// General MIDI program table (§4.4, §6) restricted to the instruments the
/// knowledge base actually recommends.
pub const INSTRUMENTS: &[Instrument] = &[
    Instrument { key: "acoustic_grand_piano", program: 0, family: InstrumentFamily::Piano, versatility: 0.95 },
    Instrument { key: "electric_piano", program: 4, family: InstrumentFamily::Keys, versatility: 0.85 },
    Instrument { key: "rhodes", program: 4, family: InstrumentFamily::Keys, versatility: 0.8 },
    Instrument { key: "harpsichord", program: 6, family: InstrumentFamily::Keys, versatility: 0.5 },
    Instrument { key: "celesta", program: 8, family: InstrumentFamily::Keys, versatility: 0.4 },
    Instrument { key: "music_box", program: 10, family: InstrumentFamily::Keys, versatility: 0.3 },
    Instrument { key: "nylon_guitar", program: 24, family: InstrumentFamily::Guitar, versatility: 0.7 },
    Instrument { key: "clean_electric_guitar", program: 27, family: InstrumentFamily::Guitar, versatility: 0.75 },
    Instrument { key: "distortion_guitar", program: 30, family: InstrumentFamily::Guitar, versatility: 0.6 },
    Instrument { key: "funk_guitar", program: 28, family: InstrumentFamily::Guitar, versatility: 0.55 },
    Instrument { key: "acoustic_bass", program: 32, family: InstrumentFamily::Bass, versatility: 0.6 },
    Instrument { key: "finger_bass", program: 33, family: InstrumentFamily::Bass, versatility: 0.85 },
    Instrument { key: "pick_bass", program: 34, family: InstrumentFamily::Bass, versatility: 0.65 },
    Instrument { key: "fretless_bass", program: 35, family: InstrumentFamily::Bass, versatility: 0.5 },
    Instrument { key: "synth_bass", program: 38, family: InstrumentFamily::Bass, versatility: 0.7 },
    Instrument { key: "violin", program: 40, family: InstrumentFamily::Strings, versatility: 0.6 },
    Instrument { key: "cello", program: 42, family: InstrumentFamily::Strings, versatility: 0.55 },
    Instrument { key: "string_ensemble", program: 48, family: InstrumentFamily::Strings, versatility: 0.9 },
    Instrument { key: "synth_strings", program: 50, family: InstrumentFamily::Strings, versatility: 0.7 },
    Instrument { key: "choir_aahs", program: 52, family: InstrumentFamily::Strings, versatility: 0.4 },
    Instrument { key: "trumpet", program: 56, family: InstrumentFamily::Brass, versatility: 0.5 },
    Instrument { key: "brass_section", program: 61, family: InstrumentFamily::Brass, versatility: 0.65 },
    Instrument { key: "soprano_sax", program: 64, family: InstrumentFamily::Woodwind, versatility: 0.45 },
    Instrument { key: "alto_sax", program: 65, family: InstrumentFamily::Woodwind, versatility: 0.55 },
    Instrument { key: "flute", program: 73, family: InstrumentFamily::Woodwind, versatility: 0.5 },
    Instrument { key: "pan_flute", program: 75, family: InstrumentFamily::Ethnic, versatility: 0.35 },
    Instrument { key: "shakuhachi", program: 77, family: InstrumentFamily::Ethnic, versatility: 0.3 },
    Instrument { key: "koto", program: 107, family: InstrumentFamily::Ethnic, versatility: 0.3 },
    Instrument { key: "sitar", program: 104, family: InstrumentFamily::Ethnic, versatility: 0.3 },
    Instrument { key: "square_lead", program: 80, family: InstrumentFamily::SynthLead, versatility: 0.7 },
    Instrument { key: "saw_lead", program: 81, family: InstrumentFamily::SynthLead, versatility: 0.75 },
    Instrument { key: "calliope_lead", program: 82, family: InstrumentFamily::SynthLead, versatility: 0.4 },
    Instrument { key: "warm_pad", program: 89, family: InstrumentFamily::SynthPad, versatility: 0.8 },
    Instrument { key: "polysynth_pad", program: 90, family: InstrumentFamily::SynthPad, versatility: 0.6 },
    Instrument { key: "halo_pad", program: 94, family: InstrumentFamily::SynthPad, versatility: 0.45 },
    Instrument { key: "sweep_pad", program: 95, family: InstrumentFamily::SynthPad, versatility: 0.4 },
    Instrument { key: "rain_fx", program: 96, family: InstrumentFamily::Fx, versatility: 0.3 },
    Instrument { key: "crystal_fx", program: 98, family: InstrumentFamily::Fx, versatility: 0.3 },
    Instrument { key: "atmosphere_fx", program: 99, family: InstrumentFamily::Fx, versatility: 0.35 },
    Instrument { key: "sci_fi_fx", program: 103, family: InstrumentFamily::Fx, versatility: 0.25 },
    Instrument { key: "drum_kit", program: 0, family: InstrumentFamily::Drum, versatility: 0.9 },
];

pub fn instrument_by_key(key: &str) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.key == key)
}

#[derive(Debug, Clone)]
pub struct GenreProfile {
    pub tempo_range: (u32, u32),
    pub default_scale: Scale,
    pub default_mode: Mode,
    pub preferred: &'static [(TrackType, &'static [&'static str])],
    /// Scale degrees (0-indexed) of a chord-progression template, repeated
    /// across a section by the harmony generator (§4.7).
    pub chord_progression: &'static [usize],
    pub density_bias: f32,
    pub rhythmic_target: f32,
}

macro_rules! genre_profile {
    ($tempo:expr, $scale:expr, $mode:expr, $preferred:expr, $prog:expr, $density:expr, $rhythmic:expr) => {
        GenreProfile {
            tempo_range: $tempo,
            default_scale: $scale,
            default_mode: $mode,
            preferred: $preferred,
            chord_progression: $prog,
            density_bias: $density,
            rhythmic_target: $rhythmic,
        }
    };
}

pub fn genre_profile(genre: Genre) -> GenreProfile {
    use TrackType::*;
    match genre {
        Genre::Pop => genre_profile!(
            (95, 128), Scale::Major, Mode::Major,
            &[(Lead, &["acoustic_grand_piano", "saw_lead"]), (Harmony, &["electric_piano", "warm_pad"]),
              (Bass, &["finger_bass"]), (Drums, &["drum_kit"])],
            &[0, 4, 5, 3], 0.6, 0.8
        ),
        Genre::Rock => genre_profile!(
            (110, 150), Scale::Major, Mode::Major,
            &[(Lead, &["distortion_guitar", "saw_lead"]), (Harmony, &["clean_electric_guitar"]),
              (Bass, &["pick_bass"]), (Drums, &["drum_kit"])],
            &[0, 3, 4, 0], 0.7, 0.75
        ),
        Genre::Jazz => genre_profile!(
            (90, 160), Scale::Dorian, Mode::Minor,
            &[(Lead, &["alto_sax", "trumpet"]), (Harmony, &["electric_piano", "rhodes"]),
              (Bass, &["acoustic_bass"]), (Drums, &["drum_kit"])],
            &[1, 4, 0, 5], 0.6, 0.4
        ),
        Genre::Classical => genre_profile!(
            (60, 120), Scale::Major, Mode::Major,
            &[(Lead, &["violin", "flute"]), (Harmony, &["string_ensemble"]),
              (Bass, &["cello"]), (Drums, &["drum_kit"])],
            &[0, 3, 4, 0], 0.5, 0.85
        ),
        Genre::Electronic => genre_profile!(
            (120, 140), Scale::NaturalMinor, Mode::Minor,
            &[(Lead, &["saw_lead", "square_lead"]), (Harmony, &["synth_strings", "polysynth_pad"]),
              (Bass, &["synth_bass"]), (Drums, &["drum_kit"])],
            &[0, 5, 3, 4], 0.75, 0.55
        ),
        Genre::Lofi => genre_profile!(
            (65, 90), Scale::Dorian, Mode::Minor,
            &[(Lead, &["electric_piano", "rhodes"]), (Harmony, &["electric_piano"]),
              (Bass, &["finger_bass"]), (Drums, &["drum_kit"])],
            &[1, 4, 0, 5], 0.45, 0.5
        ),
        Genre::Ambient => genre_profile!(
            (50, 90), Scale::Major, Mode::Major,
            &[(Lead, &["flute", "halo_pad"]), (Harmony, &["warm_pad", "sweep_pad"]),
              (Bass, &["fretless_bass"]), (Drums, &["drum_kit"])],
            &[0, 5, 3, 4], 0.3, 0.9
        ),
        Genre::Cinematic => genre_profile!(
            (60, 130), Scale::NaturalMinor, Mode::Minor,
            &[(Lead, &["violin", "brass_section"]), (Harmony, &["string_ensemble", "choir_aahs"]),
              (Bass, &["cello"]), (Drums, &["drum_kit"])],
            &[0, 5, 3, 4], 0.55, 0.7
        ),
        Genre::Funk => genre_profile!(
            (95, 118), Scale::Dorian, Mode::Minor,
            &[(Lead, &["funk_guitar", "alto_sax"]), (Harmony, &["electric_piano"]),
              (Bass, &["synth_bass", "pick_bass"]), (Drums, &["drum_kit"])],
            &[0, 0, 3, 4], 0.8, 0.3
        ),
        Genre::Rnb => genre_profile!(
            (70, 105), Scale::Dorian, Mode::Minor,
            &[(Lead, &["electric_piano"]), (Harmony, &["rhodes", "warm_pad"]),
              (Bass, &["finger_bass"]), (Drums, &["drum_kit"])],
            &[5, 3, 0, 4], 0.55, 0.45
        ),
        Genre::Other => genre_profile!(
            (100, 130), Scale::Major, Mode::Major,
            &[(Lead, &["acoustic_grand_piano"]), (Harmony, &["warm_pad"]),
              (Bass, &["finger_bass"]), (Drums, &["drum_kit"])],
            &[0, 4, 5, 3], 0.6, 0.7
        ),
    }
}

pub fn preferred_instruments(genre: Genre, track_type: TrackType) -> &'static [&'static str] {
    genre_profile(genre)
        .preferred
        .iter()
        .find(|(t, _)| *t == track_type)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Copy)]
pub struct EmotionProfile {
    pub tempo_multiplier: f32,
    pub mode_preference: Option<Mode>,
    pub consonance_target: f32,
    pub instrument_affinities: &'static [&'static str],
}

pub fn emotion_profile(emotion: Emotion) -> EmotionProfile {
    match emotion {
        Emotion::Peaceful => EmotionProfile { tempo_multiplier: 0.8, mode_preference: Some(Mode::Major), consonance_target: 0.9, instrument_affinities: &["warm_pad", "flute", "halo_pad"] },
        Emotion::Epic => EmotionProfile { tempo_multiplier: 1.05, mode_preference: Some(Mode::Minor), consonance_target: 0.6, instrument_affinities: &["brass_section", "string_ensemble", "choir_aahs"] },
        Emotion::Sad => EmotionProfile { tempo_multiplier: 0.75, mode_preference: Some(Mode::Minor), consonance_target: 0.7, instrument_affinities: &["cello", "rhodes", "violin"] },
        Emotion::Happy => EmotionProfile { tempo_multiplier: 1.1, mode_preference: Some(Mode::Major), consonance_target: 0.85, instrument_affinities: &["acoustic_grand_piano", "saw_lead"] },
        Emotion::Energetic => EmotionProfile { tempo_multiplier: 1.2, mode_preference: None, consonance_target: 0.5, instrument_affinities: &["distortion_guitar", "synth_bass", "saw_lead"] },
        Emotion::Mysterious => EmotionProfile { tempo_multiplier: 0.9, mode_preference: Some(Mode::Minor), consonance_target: 0.4, instrument_affinities: &["sci_fi_fx", "sweep_pad", "atmosphere_fx"] },
        Emotion::Triumphant => EmotionProfile { tempo_multiplier: 1.0, mode_preference: Some(Mode::Major), consonance_target: 0.75, instrument_affinities: &["brass_section", "string_ensemble"] },
        Emotion::Melancholic => EmotionProfile { tempo_multiplier: 0.7, mode_preference: Some(Mode::Minor), consonance_target: 0.65, instrument_affinities: &["rhodes", "cello", "fretless_bass"] },
        Emotion::Other => EmotionProfile { tempo_multiplier: 1.0, mode_preference: None, consonance_target: 0.7, instrument_affinities: &[] },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StyleProfile {
    pub tempo_multiplier: f32,
    pub instrument_affinities: &'static [&'static str],
}

pub fn style_profile(style: StyleDescriptor) -> StyleProfile {
    match style {
        StyleDescriptor::Ambient => StyleProfile { tempo_multiplier: 0.85, instrument_affinities: &["warm_pad", "halo_pad", "atmosphere_fx"] },
        StyleDescriptor::Cinematic => StyleProfile { tempo_multiplier: 1.0, instrument_affinities: &["string_ensemble", "brass_section"] },
        StyleDescriptor::Funky => StyleProfile { tempo_multiplier: 1.05, instrument_affinities: &["funk_guitar", "synth_bass"] },
        StyleDescriptor::Minimal => StyleProfile { tempo_multiplier: 0.95, instrument_affinities: &["electric_piano", "rhodes"] },
        StyleDescriptor::Ethereal => StyleProfile { tempo_multiplier: 0.8, instrument_affinities: &["halo_pad", "crystal_fx", "choir_aahs"] },
        StyleDescriptor::Orchestral => StyleProfile { tempo_multiplier: 1.0, instrument_affinities: &["string_ensemble", "brass_section", "cello"] },
        StyleDescriptor::Rhythmic => StyleProfile { tempo_multiplier: 1.1, instrument_affinities: &["finger_bass", "drum_kit"] },
        StyleDescriptor::Other => StyleProfile { tempo_multiplier: 1.0, instrument_affinities: &[] },
    }
}

/// Resolves an instrument for `(track_type, genre, emotions, styles)` per
/// the §4.4 selection contract:
/// `score = 0.4*genre_fit + 0.3*emotion_fit + 0.2*style_fit + 0.1*versatility`,
/// ties broken by the candidate's position in the genre's preferred list.
pub fn resolve_instrument(
    track_type: TrackType,
    genre: Genre,
    emotions: &std::collections::BTreeSet<Emotion>,
    styles: &std::collections::BTreeSet<StyleDescriptor>,
) -> &'static Instrument {
    let preferred = preferred_instruments(genre, track_type);
    let family_for_type = family_for_track_type(track_type);

    let candidates: Vec<&'static Instrument> = if !preferred.is_empty() {
        preferred.iter().filter_map(|k| instrument_by_key(k)).collect()
    } else {
        INSTRUMENTS.iter().filter(|i| i.family == family_for_type).collect()
    };

    let candidates: Vec<&'static Instrument> = if candidates.is_empty() {
        INSTRUMENTS.iter().collect()
    } else {
        candidates
    };

    let mut best = candidates[0];
    let mut best_score = -1.0f32;
    for (priority, candidate) in candidates.iter().enumerate() {
        let genre_fit = if preferred.contains(&candidate.key) { 1.0 } else { 0.3 };
        let emotion_fit = affinity_fraction(candidate.key, emotions.iter().map(|e| emotion_profile(*e).instrument_affinities));
        let style_fit = affinity_fraction(candidate.key, styles.iter().map(|s| style_profile(*s).instrument_affinities));
        let score = 0.4 * genre_fit + 0.3 * emotion_fit + 0.2 * style_fit + 0.1 * candidate.versatility;
        // Ties broken by priority field (earlier candidates win ties).
        if score > best_score + 1e-6 || (priority == 0 && best_score < 0.0) {
            best_score = score;
            best = candidate;
        }
    }
    best
}

fn affinity_fraction<'a, I: Iterator<Item = &'a [&'static str]>>(key: &str, profiles: I) -> f32 {
    let mut total = 0usize;
    let mut hits = 0usize;
    for affinities in profiles {
        total += 1;
        if affinities.contains(&key) {
            hits += 1;
        }
    }
    if total == 0 {
        0.5
    } else {
        hits as f32 / total as f32
    }
}

pub fn family_for_track_type(track_type: TrackType) -> InstrumentFamily {
    match track_type {
        TrackType::Lead | TrackType::CounterMelody => InstrumentFamily::SynthLead,
        TrackType::Harmony => InstrumentFamily::Keys,
        TrackType::Bass => InstrumentFamily::Bass,
        TrackType::Drums => InstrumentFamily::Drum,
        TrackType::Arpeggio => InstrumentFamily::SynthLead,
        TrackType::Pad => InstrumentFamily::SynthPad,
        TrackType::Fx => InstrumentFamily::Fx,
    }
}

/// Infers a track type from an instrument family, used when the intent
/// specifies explicit instruments (§4.6 step 1).
pub fn track_type_for_family(family: InstrumentFamily) -> TrackType {
    match family {
        InstrumentFamily::Drum | InstrumentFamily::Percussion => TrackType::Drums,
        InstrumentFamily::Bass => TrackType::Bass,
        InstrumentFamily::SynthPad => TrackType::Pad,
        InstrumentFamily::Strings => TrackType::Harmony,
        InstrumentFamily::Fx => TrackType::Fx,
        _ => TrackType::Lead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_genre_has_a_profile_with_four_track_types() {
        for &genre in Genre::all() {
            let profile = genre_profile(genre);
            assert!(profile.tempo_range.0 < profile.tempo_range.1);
            assert!(!profile.chord_progression.is_empty());
        }
    }

    #[test]
    fn resolve_instrument_prefers_genre_list() {
        let instrument = resolve_instrument(
            TrackType::Bass,
            Genre::Jazz,
            &Default::default(),
            &Default::default(),
        );
        assert_eq!(instrument.key, "acoustic_bass");
    }

    #[test]
    fn unknown_genre_degrades_to_other() {
        let genre: Genre = "nonsense".parse().unwrap();
        assert_eq!(genre, Genre::Other);
    }
}
