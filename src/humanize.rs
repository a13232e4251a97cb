//! Humanizer (C8, §4.8): post-pass timing/velocity/duration perturbation by
//! track type.

use crate::intent::{Genre, TrackType};
use crate::model::{Note, Track};
use crate::variation::VariationEngine;

struct Sigma {
    timing: f64,
    velocity: f64,
    duration: f64,
}

fn sigma_for(track_type: TrackType) -> Sigma {
    match track_type {
        TrackType::Lead => Sigma { timing: 0.03, velocity: 8.0, duration: 0.0 },
        TrackType::CounterMelody => Sigma { timing: 0.03, velocity: 8.0, duration: 0.0 },
        TrackType::Harmony => Sigma { timing: 0.02, velocity: 6.0, duration: 0.0 },
        TrackType::Bass => Sigma { timing: 0.025, velocity: 7.0, duration: 0.0 },
        TrackType::Drums => Sigma { timing: 0.015, velocity: 7.0, duration: 0.0 },
        TrackType::Arpeggio => Sigma { timing: 0.02, velocity: 8.0, duration: 0.0 },
        TrackType::Pad => Sigma { timing: 0.05, velocity: 4.0, duration: 0.0 },
        TrackType::Fx => Sigma { timing: 0.08, velocity: 10.0, duration: 0.0 },
    }
}

/// Hi-hats get a wider velocity sigma than the rest of the drum kit
/// (§4.8). General MIDI closed/open hats are 42 and 46.
fn drum_velocity_sigma(pitch: u8) -> f64 {
    if pitch == 42 || pitch == 46 {
        10.0
    } else {
        7.0
    }
}

pub fn humanize_track(track: &mut Track, beats_per_bar: f64, genre: Genre, variation: &mut VariationEngine) {
    let sigma = sigma_for(track.track_type);
    let swing_genre = matches!(genre, Genre::Jazz | Genre::Lofi);

    for note in track.notes.iter_mut() {
        let velocity_sigma = if track.track_type == TrackType::Drums {
            drum_velocity_sigma(note.pitch)
        } else {
            sigma.velocity
        };

        let mut start = variation.jitter_timing(note.start_time, sigma.timing);
        let duration = (note.duration + variation.gaussian(0.0, 0.02)).max(0.1);
        let mut velocity = variation.jitter_velocity(note.velocity, velocity_sigma);

        let near_bar_boundary = (note.start_time % beats_per_bar).min(beats_per_bar - (note.start_time % beats_per_bar)) < 0.1;
        if near_bar_boundary {
            velocity = ((velocity as f64 * 1.2).round() as u8).clamp(30, 127);
        }

        if swing_genre && is_off_eighth(note.start_time, beats_per_bar) {
            start += 0.05;
        }

        *note = Note {
            pitch: note.pitch,
            start_time: start,
            duration,
            velocity,
        };
    }

    track.sort_notes();
}

fn is_off_eighth(start_time: f64, beats_per_bar: f64) -> bool {
    let eighth = 0.5;
    let pos = start_time % beats_per_bar;
    let steps = (pos / eighth).round();
    (pos - steps * eighth).abs() < 1e-6 && (steps as i64 % 2 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_keeps_notes_in_bounds() {
        let mut track = Track {
            name: "lead".into(),
            track_type: TrackType::Lead,
            channel: 0,
            program: 0,
            notes: vec![Note { pitch: 60, start_time: 0.0, duration: 1.0, velocity: 80 }],
        };
        let mut variation = VariationEngine::from_seed(42);
        humanize_track(&mut track, 4.0, Genre::Pop, &mut variation);
        for n in &track.notes {
            assert!(n.start_time >= 0.0);
            assert!(n.duration >= 0.1);
            assert!((30..=127).contains(&n.velocity));
        }
    }
}
