//! Track-Type Generators (§4.7): one pure-ish function per closed variant
//! of `TrackType`, each consuming `(TrackConfig, Section, intent, theory,
//! variation)` and returning notes relative to the section start. The
//! orchestrator offsets them by `section.start_bar * beats_per_bar`.
//!
//! §9's "dynamic per-agent dispatch" re-architecture note: this replaces an
//! open-ended function registry with a closed match over `TrackType` — no
//! runtime registration.

mod arpeggio;
mod bass;
mod counter_melody;
mod drums;
mod fx;
mod harmony;
mod lead;
mod pad;

use crate::intent::{Genre, Intent, TrackType};
use crate::knowledge;
use crate::model::{Note, TrackConfig};
use crate::sections::Section;
use crate::theory::{self, Scale};
use crate::variation::VariationEngine;

/// Shared, read-only context every generator needs. Built once per
/// generation by the orchestrator from the resolved intent.
pub struct GenContext {
    pub genre: Genre,
    pub scale: Scale,
    pub scale_pitches: Vec<u8>,
    pub beats_per_bar: f64,
    pub unison_guard_beats: f64,
}

impl GenContext {
    pub fn new(intent: &Intent, unison_guard_beats: f64, beats_per_bar: u32) -> Self {
        let scale = intent
            .scale_name
            .as_deref()
            .and_then(Scale::from_name)
            .or_else(|| intent.cultural_style.as_deref().and_then(Scale::from_name))
            .unwrap_or_else(|| Scale::for_mode(intent.mode));
        let scale_pitches = theory::scale_notes(intent.root, scale, 2..=6);
        GenContext {
            genre: intent.genre,
            scale,
            scale_pitches,
            beats_per_bar: beats_per_bar as f64,
            unison_guard_beats,
        }
    }

    /// Pitches near the middle of the usable range, used as a target
    /// center for motif construction (§4.7 lead).
    pub fn pitch_center(&self) -> u8 {
        let mid = self.scale_pitches.len() / 2;
        self.scale_pitches.get(mid).copied().unwrap_or(60)
    }
}

/// One chord per bar of a section, voice-led sequentially. `prev_chord` is
/// threaded across sections so voice leading continues across the whole
/// composition, not just within one section (§4.2, §4.7 harmony).
pub struct SectionChords {
    pub per_bar: Vec<Vec<u8>>,
}

pub fn build_section_chords(
    section: &Section,
    intent: &Intent,
    ctx: &GenContext,
    prev_chord: &mut Vec<u8>,
) -> SectionChords {
    let progression = knowledge::genre_profile(intent.genre).chord_progression;
    let bars = section.bars().max(1);
    let mut per_bar = Vec::with_capacity(bars as usize);
    for bar in 0..bars {
        let degree = progression[(bar as usize) % progression.len()];
        let quality = theory::diatonic_quality(ctx.scale, degree);
        let raw = theory::chord_from_degree(intent.root, ctx.scale, degree, quality);
        let voiced = theory::voice_lead(prev_chord, &raw);
        *prev_chord = voiced.clone();
        per_bar.push(voiced);
    }
    SectionChords { per_bar }
}

pub use arpeggio::generate as generate_arpeggio;
pub use bass::generate as generate_bass;
pub use counter_melody::generate as generate_counter_melody;
pub use drums::generate as generate_drums;
pub use fx::generate as generate_fx;
pub use harmony::generate as generate_harmony;
pub use lead::generate as generate_lead;
pub use pad::generate as generate_pad;

/// Dispatches to the right generator for `config.track_type` (§9's closed
/// variant dispatch).
#[allow(clippy::too_many_arguments)]
pub fn generate_for_track(
    config: &TrackConfig,
    section: &Section,
    intent: &Intent,
    ctx: &GenContext,
    chords: &SectionChords,
    lead_notes: Option<&[Note]>,
    variation: &mut VariationEngine,
) -> Vec<Note> {
    match config.track_type {
        TrackType::Lead => lead::generate(section, intent, ctx, variation),
        TrackType::CounterMelody => {
            counter_melody::generate(section, intent, ctx, lead_notes.unwrap_or(&[]), variation)
        }
        TrackType::Harmony => harmony::generate(section, ctx, chords, variation),
        TrackType::Bass => bass::generate(section, intent, ctx, chords, variation),
        TrackType::Drums => drums::generate(section, intent, ctx, variation),
        TrackType::Arpeggio => arpeggio::generate(section, ctx, chords, variation),
        TrackType::Pad => pad::generate(section, ctx, chords, variation),
        TrackType::Fx => fx::generate(section, ctx, variation),
    }
}

/// Order generators must run in within a section so dependent generators
/// (counter-melody needs lead; bass/arpeggio/pad need harmony) see their
/// inputs. Track types absent from the plan are simply skipped.
pub const GENERATION_ORDER: [TrackType; 8] = [
    TrackType::Lead,
    TrackType::Harmony,
    TrackType::CounterMelody,
    TrackType::Bass,
    TrackType::Arpeggio,
    TrackType::Pad,
    TrackType::Drums,
    TrackType::Fx,
];
