//! Arpeggio generator (§4.7): cycles the current chord's pitches at
//! density-determined subdivisions, with octave shifts on bar boundaries.

use crate::model::Note;
use crate::sections::Section;
use crate::variation::VariationEngine;

use super::{GenContext, SectionChords};

#[derive(Clone, Copy)]
enum Pattern {
    Up,
    Down,
    UpDown,
}

fn ordered_indices(len: usize, pattern: Pattern) -> Vec<usize> {
    match pattern {
        Pattern::Up => (0..len).collect(),
        Pattern::Down => (0..len).rev().collect(),
        Pattern::UpDown => {
            let mut v: Vec<usize> = (0..len).collect();
            v.extend((0..len).rev().skip(1).take(len.saturating_sub(2)));
            v
        }
    }
}

pub fn generate(section: &Section, ctx: &GenContext, chords: &SectionChords, variation: &mut VariationEngine) -> Vec<Note> {
    let velocity_base = (60.0 + 30.0 * section.energy_level) as u8;
    let subdivisions = if section.density_level > 0.75 {
        16
    } else if section.density_level > 0.5 {
        8
    } else {
        4
    };
    let step = ctx.beats_per_bar / subdivisions as f64;

    let pattern = *variation.choose(&[Pattern::Up, Pattern::Down, Pattern::UpDown]);
    let mut notes = Vec::new();

    for (bar, chord) in chords.per_bar.iter().enumerate() {
        if chord.is_empty() {
            continue;
        }
        let bar_start = bar as f64 * ctx.beats_per_bar;
        let octave_shift: i32 = if bar % 2 == 1 { 12 } else { 0 };
        let indices = ordered_indices(chord.len(), pattern);
        for i in 0..subdivisions {
            let idx = indices[i % indices.len()];
            let pitch = (chord[idx] as i32 + octave_shift).clamp(0, 127) as u8;
            notes.push(Note {
                pitch,
                start_time: bar_start + i as f64 * step,
                duration: step * 0.9,
                velocity: variation.jitter_velocity(velocity_base, 6.0),
            });
        }
    }

    notes
}
