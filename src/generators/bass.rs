//! Bass generator (§4.7): follows harmony roots, with a density-driven
//! pattern and a walking approach-tone pattern for jazz.

use crate::intent::{Energy, Genre, Intent};
use crate::model::Note;
use crate::sections::Section;
use crate::variation::VariationEngine;

use super::{GenContext, SectionChords};

fn to_bass_register(pitch: u8) -> u8 {
    pitch.saturating_sub(24).max(24)
}

pub fn generate(section: &Section, intent: &Intent, ctx: &GenContext, chords: &SectionChords, variation: &mut VariationEngine) -> Vec<Note> {
    let velocity_base = (65.0 + 30.0 * section.energy_level) as u8;
    let beats = ctx.beats_per_bar;
    let mut notes = Vec::new();

    for (bar, chord) in chords.per_bar.iter().enumerate() {
        let bar_start = bar as f64 * beats;
        let root = to_bass_register(chord.first().copied().unwrap_or(40));
        let fifth = to_bass_register(chord.get(2).copied().unwrap_or(root + 7));

        if intent.genre == Genre::Jazz {
            let next_root = chords
                .per_bar
                .get(bar + 1)
                .and_then(|c| c.first().copied())
                .map(to_bass_register)
                .unwrap_or(root);
            walking_bar(bar_start, beats, root, next_root, velocity_base, ctx, &mut notes, variation);
            continue;
        }

        match intent.energy {
            Energy::Low => {
                notes.push(Note {
                    pitch: root,
                    start_time: bar_start,
                    duration: beats,
                    velocity: variation.jitter_velocity(velocity_base, 6.0),
                });
            }
            Energy::Medium => {
                notes.push(Note {
                    pitch: root,
                    start_time: bar_start,
                    duration: beats / 2.0,
                    velocity: variation.jitter_velocity(velocity_base, 6.0),
                });
                notes.push(Note {
                    pitch: fifth,
                    start_time: bar_start + beats / 2.0,
                    duration: beats / 2.0,
                    velocity: variation.jitter_velocity(velocity_base, 6.0),
                });
            }
            Energy::High => {
                syncopated_bar(bar_start, beats, root, fifth, velocity_base, ctx, &mut notes, variation);
            }
        }
    }

    notes
}

fn syncopated_bar(
    bar_start: f64,
    beats: f64,
    root: u8,
    fifth: u8,
    velocity_base: u8,
    ctx: &GenContext,
    notes: &mut Vec<Note>,
    variation: &mut VariationEngine,
) {
    let sixteenth = beats / 16.0;
    let pattern_steps: &[(f64, bool)] = &[
        (0.0, true),
        (3.0, true),
        (6.0, false),
        (8.0, true),
        (11.0, false),
        (14.0, true),
    ];
    for &(step, is_root) in pattern_steps {
        let passing = *ctx
            .scale_pitches
            .iter()
            .filter(|&&p| p < root)
            .last()
            .unwrap_or(&root);
        let pitch = if is_root { root } else { if variation.bernoulli(0.3) { passing } else { fifth } };
        notes.push(Note {
            pitch,
            start_time: bar_start + step * sixteenth,
            duration: sixteenth * 2.0,
            velocity: variation.jitter_velocity(velocity_base, 8.0),
        });
    }
}

fn walking_bar(
    bar_start: f64,
    beats: f64,
    root: u8,
    next_root: u8,
    velocity_base: u8,
    ctx: &GenContext,
    notes: &mut Vec<Note>,
    variation: &mut VariationEngine,
) {
    let quarter = beats / 4.0;
    let approach = if next_root > root { next_root - 1 } else { next_root + 1 };
    let passing = *ctx
        .scale_pitches
        .iter()
        .find(|&&p| p > root)
        .unwrap_or(&root);
    let steps = [root, passing, (root + next_root) / 2, approach];
    for (i, &pitch) in steps.iter().enumerate() {
        notes.push(Note {
            pitch,
            start_time: bar_start + i as f64 * quarter,
            duration: quarter,
            velocity: variation.jitter_velocity(velocity_base, 7.0),
        });
    }
}
