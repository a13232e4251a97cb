//! Harmony (chords) generator (§4.7): walks the genre's degree progression,
//! one voiced chord per bar by default, broken into arpeggiated eighths
//! when the section is dense.

use crate::model::Note;
use crate::sections::Section;
use crate::variation::VariationEngine;

use super::{GenContext, SectionChords};

pub fn generate(section: &Section, ctx: &GenContext, chords: &SectionChords, variation: &mut VariationEngine) -> Vec<Note> {
    let velocity_base = (55.0 + 30.0 * section.energy_level) as u8;
    let mut notes = Vec::new();

    for (bar, chord) in chords.per_bar.iter().enumerate() {
        let bar_start = bar as f64 * ctx.beats_per_bar;
        if section.density_level > 0.75 {
            let step = ctx.beats_per_bar / (chord.len().max(1) as f64 * 2.0);
            let mut t = bar_start;
            for _ in 0..(chord.len() * 2) {
                for &pitch in chord {
                    notes.push(Note {
                        pitch,
                        start_time: t,
                        duration: step,
                        velocity: variation.jitter_velocity(velocity_base, 5.0),
                    });
                }
                t += step;
                if t >= bar_start + ctx.beats_per_bar {
                    break;
                }
            }
        } else {
            for &pitch in chord {
                notes.push(Note {
                    pitch,
                    start_time: bar_start,
                    duration: ctx.beats_per_bar,
                    velocity: variation.jitter_velocity(velocity_base, 5.0),
                });
            }
        }
    }

    notes
}
