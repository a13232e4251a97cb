//! Drums generator (§4.7): General MIDI percussion map on channel 9.

use crate::intent::{Energy, Genre, Intent};
use crate::model::Note;
use crate::sections::{Characteristic, Section};
use crate::variation::VariationEngine;

use super::GenContext;

const KICK: u8 = 36;
const SNARE: u8 = 38;
const CLOSED_HAT: u8 = 42;
const OPEN_HAT: u8 = 46;
const LOW_TOM: u8 = 45;
const MID_TOM: u8 = 47;
const HIGH_TOM: u8 = 50;

fn swings(genre: Genre) -> bool {
    matches!(genre, Genre::Jazz | Genre::Lofi)
}

pub fn generate(section: &Section, intent: &Intent, ctx: &GenContext, variation: &mut VariationEngine) -> Vec<Note> {
    let swing = swings(intent.genre);
    let beats = ctx.beats_per_bar;
    let mut notes = Vec::new();

    for bar in 0..section.bars() {
        let bar_start = bar as f64 * beats;
        kick_snare_pattern(bar_start, beats, intent.energy, swing, &mut notes, variation);

        let is_last_bar = bar + 1 == section.bars();
        let builds_to_peak = section.characteristics.contains(&Characteristic::Build);
        if is_last_bar && builds_to_peak && intent.energy == Energy::High {
            tom_fill(bar_start, beats, &mut notes, variation);
        }
    }

    notes
}

fn offbeat_time(base: f64, swing: bool) -> f64 {
    if swing {
        base + 0.05
    } else {
        base
    }
}

fn kick_snare_pattern(
    bar_start: f64,
    beats: f64,
    energy: Energy,
    swing: bool,
    notes: &mut Vec<Note>,
    variation: &mut VariationEngine,
) {
    let eighth = beats / 8.0;
    match energy {
        Energy::Low => {
            push(notes, KICK, bar_start, 100, variation);
            push(notes, KICK, bar_start + beats / 2.0, 95, variation);
        }
        Energy::Medium => {
            push(notes, KICK, bar_start, 105, variation);
            push(notes, KICK, bar_start + beats / 2.0, 95, variation);
            push(notes, SNARE, bar_start + beats / 4.0, 100, variation);
            push(notes, SNARE, bar_start + 3.0 * beats / 4.0, 100, variation);
            for i in 0..8 {
                let t = bar_start + i as f64 * eighth;
                let t = if i % 2 == 1 { offbeat_time(t, swing) } else { t };
                push(notes, CLOSED_HAT, t, 70, variation);
            }
        }
        Energy::High => {
            push(notes, KICK, bar_start, 110, variation);
            push(notes, KICK, bar_start + beats / 2.0, 105, variation);
            push(notes, KICK, bar_start + 3.0 * beats / 4.0, 90, variation);
            push(notes, SNARE, bar_start + beats / 4.0, 105, variation);
            push(notes, SNARE, bar_start + 3.0 * beats / 4.0, 105, variation);
            let sixteenth = beats / 16.0;
            for i in 0..16 {
                let t = bar_start + i as f64 * sixteenth;
                let t = if i % 2 == 1 { offbeat_time(t, swing) } else { t };
                let ghost = i % 4 == 2 && variation.bernoulli(0.3);
                if ghost {
                    push(notes, SNARE, t, 40, variation);
                } else {
                    let hat = if i % 4 == 0 { OPEN_HAT } else { CLOSED_HAT };
                    push(notes, hat, t, 65, variation);
                }
            }
        }
    }
}

fn tom_fill(bar_start: f64, beats: f64, notes: &mut Vec<Note>, variation: &mut VariationEngine) {
    let step = beats / 4.0;
    for (i, pitch) in [HIGH_TOM, MID_TOM, LOW_TOM, LOW_TOM].into_iter().enumerate() {
        push(notes, pitch, bar_start + 3.0 * beats / 4.0 + i as f64 * step / 4.0, 100, variation);
    }
}

fn push(notes: &mut Vec<Note>, pitch: u8, start_time: f64, velocity: u8, variation: &mut VariationEngine) {
    notes.push(Note {
        pitch,
        start_time,
        duration: 0.1,
        velocity: variation.jitter_velocity(velocity, 7.0),
    });
}
