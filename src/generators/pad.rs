//! Pad generator (§4.7): one sustained chord per 2-4 bars at low velocity,
//! with an entry/exit velocity ramp expressed purely through note
//! velocity (no MIDI CC in this core's output, per §6).

use crate::model::Note;
use crate::sections::Section;
use crate::variation::VariationEngine;

use super::{GenContext, SectionChords};

pub fn generate(section: &Section, ctx: &GenContext, chords: &SectionChords, variation: &mut VariationEngine) -> Vec<Note> {
    let mut notes = Vec::new();
    let total_bars = section.bars();
    let mut bar = 0u32;

    while bar < total_bars {
        let span = (variation.uniform_int(2, 5) as u32).min(total_bars - bar);
        let chord = chords
            .per_bar
            .get(bar as usize)
            .cloned()
            .unwrap_or_default();
        let chunk_start = bar as f64 * ctx.beats_per_bar;
        let chunk_len = span as f64 * ctx.beats_per_bar;

        let entry_len = (chunk_len * 0.1).min(1.0).max(0.1);
        let exit_len = entry_len;
        let main_len = (chunk_len - entry_len - exit_len).max(0.1);

        for &pitch in &chord {
            notes.push(Note {
                pitch,
                start_time: chunk_start,
                duration: entry_len,
                velocity: variation.jitter_velocity(42, 3.0),
            });
            notes.push(Note {
                pitch,
                start_time: chunk_start + entry_len,
                duration: main_len,
                velocity: variation.jitter_velocity(55, 3.0),
            });
            notes.push(Note {
                pitch,
                start_time: chunk_start + entry_len + main_len,
                duration: exit_len,
                velocity: variation.jitter_velocity(42, 3.0),
            });
        }

        bar += span.max(1);
    }

    notes
}
