//! FX generator (§4.7): sparse — roughly one onset per section, pitches
//! drawn from scale extremes, long durations.

use crate::model::Note;
use crate::sections::Section;
use crate::variation::VariationEngine;

use super::GenContext;

pub fn generate(section: &Section, ctx: &GenContext, variation: &mut VariationEngine) -> Vec<Note> {
    if !variation.bernoulli(0.85) {
        return Vec::new();
    }

    let extremes: Vec<u8> = {
        let mut sorted = ctx.scale_pitches.clone();
        sorted.sort_unstable();
        let mut v = Vec::new();
        if let Some(&low) = sorted.first() {
            v.push(low);
        }
        if let Some(&high) = sorted.last() {
            v.push(high);
        }
        v
    };
    if extremes.is_empty() {
        return Vec::new();
    }

    let pitch = *variation.choose(&extremes);
    let total_beats = section.bars() as f64 * ctx.beats_per_bar;
    let start_time = variation.uniform(0.0, (total_beats - 2.0).max(0.1));
    let duration = variation.uniform(2.0, total_beats.min(8.0).max(2.5));

    vec![Note {
        pitch,
        start_time,
        duration,
        velocity: variation.jitter_velocity(50, 8.0),
    }]
}
