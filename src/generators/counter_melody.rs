//! Counter-melody generator (§4.7): mirrors the lead motif by inversion or
//! retrograde, generated only after the lead track exists for the same
//! section, avoiding unison with the lead within the unison guard window.

use crate::intent::Intent;
use crate::model::Note;
use crate::sections::Section;
use crate::variation::VariationEngine;

use super::GenContext;

fn invert(pitch: u8, axis: u8) -> u8 {
    let delta = pitch as i16 - axis as i16;
    (axis as i16 - delta).clamp(0, 127) as u8
}

pub fn generate(
    section: &Section,
    _intent: &Intent,
    ctx: &GenContext,
    lead_notes: &[Note],
    variation: &mut VariationEngine,
) -> Vec<Note> {
    if lead_notes.is_empty() {
        return Vec::new();
    }

    let axis = ctx.pitch_center();
    let use_retrograde = variation.bernoulli(0.5);

    let mut source: Vec<&Note> = lead_notes.iter().collect();
    if use_retrograde {
        source.reverse();
    }

    let mut notes = Vec::with_capacity(source.len());
    for lead in source {
        let pitch = if use_retrograde {
            lead.pitch
        } else {
            let inverted = invert(lead.pitch, axis);
            *ctx.scale_pitches
                .iter()
                .min_by_key(|&&p| (p as i32 - inverted as i32).unsigned_abs())
                .unwrap_or(&inverted)
        };

        let start_time = if use_retrograde {
            section.bars() as f64 * ctx.beats_per_bar - lead.start_time - lead.duration
        } else {
            lead.start_time
        };
        let start_time = start_time.max(0.0);

        if (pitch as i32 - lead.pitch as i32).abs() == 0
            && (start_time - lead.start_time).abs() < ctx.unison_guard_beats
        {
            // Would land in unison within the guard window; nudge up a third.
            let nudged = *ctx
                .scale_pitches
                .iter()
                .find(|&&p| p > pitch)
                .unwrap_or(&pitch);
            notes.push(Note {
                pitch: nudged,
                start_time,
                duration: lead.duration,
                velocity: variation.jitter_velocity(lead.velocity.saturating_sub(10), 4.0),
            });
            continue;
        }

        notes.push(Note {
            pitch,
            start_time,
            duration: lead.duration,
            velocity: variation.jitter_velocity(lead.velocity.saturating_sub(10), 4.0),
        });
    }

    notes
}
