//! Lead (melody) generator (§4.7).

use crate::intent::{Emotion, Intent};
use crate::model::Note;
use crate::sections::Section;
use crate::theory;
use crate::variation::VariationEngine;

use super::GenContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contour {
    Ascending,
    Descending,
    Arch,
    Valley,
    CallResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    ExactRepetition,
    Transposition,
    RhythmicVariation,
    Contrast,
    SustainOrRest,
}

fn choose_contour(intent: &Intent, variation: &mut VariationEngine) -> Contour {
    if intent.emotions.contains(&Emotion::Epic) || intent.emotions.contains(&Emotion::Triumphant) {
        return Contour::Arch;
    }
    if intent.emotions.contains(&Emotion::Sad) || intent.emotions.contains(&Emotion::Melancholic) {
        return Contour::Descending;
    }
    if intent.emotions.contains(&Emotion::Peaceful) {
        return Contour::Valley;
    }
    *variation.choose(&[
        Contour::Ascending,
        Contour::Descending,
        Contour::Arch,
        Contour::Valley,
        Contour::CallResponse,
    ])
}

/// 2-4 note motif built from consonant neighbors of the section's pitch
/// center, shaped by `contour`.
fn build_motif(ctx: &GenContext, contour: Contour, variation: &mut VariationEngine) -> Vec<u8> {
    let center = ctx.pitch_center();
    let neighbors = theory::consonant_neighbors(center, &ctx.scale_pitches);
    let len = variation.uniform_int(2, 5) as usize;
    let pool: Vec<u8> = neighbors.into_iter().take(6.max(len)).collect();
    let pool = if pool.is_empty() { vec![center] } else { pool };

    let mut notes: Vec<u8> = (0..len)
        .map(|_| *variation.choose(&pool))
        .collect();

    match contour {
        Contour::Ascending => notes.sort_unstable(),
        Contour::Descending => {
            notes.sort_unstable();
            notes.reverse();
        }
        Contour::Arch => {
            notes.sort_unstable();
            if notes.len() > 2 {
                notes.swap(0, notes.len() / 2);
            }
        }
        Contour::Valley => {
            notes.sort_unstable();
            notes.reverse();
            if notes.len() > 2 {
                notes.swap(0, notes.len() / 2);
            }
        }
        Contour::CallResponse => {
            notes.sort_unstable();
        }
    }
    notes
}

fn transpose_in_scale(pitch: u8, semitones: i32, scale_pitches: &[u8]) -> u8 {
    let target = (pitch as i32 + semitones).clamp(0, 127) as u8;
    *scale_pitches
        .iter()
        .min_by_key(|&&p| (p as i32 - target as i32).unsigned_abs())
        .unwrap_or(&pitch)
}

/// Duration distribution biased by genre (§4.7 lead).
fn base_duration(genre: crate::intent::Genre, variation: &mut VariationEngine) -> f64 {
    use crate::intent::Genre::*;
    match genre {
        Jazz => *variation.choose(&[0.5, 0.5, 0.75, 0.5]), // syncopated eighths
        Ambient | Cinematic => *variation.choose(&[2.0, 4.0, 2.0]),
        Electronic => *variation.choose(&[0.25, 0.25, 0.5]),
        _ => *variation.choose(&[0.5, 1.0, 0.5, 0.25]),
    }
}

pub fn generate(section: &Section, intent: &Intent, ctx: &GenContext, variation: &mut VariationEngine) -> Vec<Note> {
    let contour = choose_contour(intent, variation);
    let mut motif = build_motif(ctx, contour, variation);

    let velocity_base = (70.0 + 40.0 * section.energy_level) as u8;
    let beats_per_bar = ctx.beats_per_bar;
    let mut notes = Vec::new();
    let mut cursor = 0.0;

    for bar in 0..section.bars() {
        let bar_start = bar as f64 * beats_per_bar;
        let op = *variation.weighted_choice(&[
            (Operation::ExactRepetition, 30u32),
            (Operation::Transposition, 25),
            (Operation::RhythmicVariation, 20),
            (Operation::Contrast, 15),
            (Operation::SustainOrRest, 10),
        ]);

        match op {
            Operation::Contrast => {
                motif = build_motif(ctx, contour, variation);
            }
            Operation::Transposition => {
                let shift = *variation.choose(&[-4i32, -2, 2, 4]);
                motif = motif
                    .iter()
                    .map(|&p| transpose_in_scale(p, shift, &ctx.scale_pitches))
                    .collect();
            }
            _ => {}
        }

        if op == Operation::SustainOrRest {
            if variation.bernoulli(0.5) {
                let pitch = motif.first().copied().unwrap_or(ctx.pitch_center());
                notes.push(Note {
                    pitch,
                    start_time: bar_start,
                    duration: beats_per_bar,
                    velocity: variation.jitter_velocity(velocity_base, 3.0),
                });
            }
            // else: rest — no notes for this bar
            continue;
        }

        cursor = bar_start;
        for &pitch in &motif {
            if cursor >= bar_start + beats_per_bar {
                break;
            }
            let mut dur = base_duration(ctx.genre, variation);
            if op == Operation::RhythmicVariation {
                dur *= if variation.bernoulli(0.5) { 0.5 } else { 2.0 };
            }
            dur = dur.min(bar_start + beats_per_bar - cursor).max(0.125);
            notes.push(Note {
                pitch,
                start_time: cursor,
                duration: dur,
                velocity: variation.jitter_velocity(velocity_base, 6.0),
            });
            cursor += dur;
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Action, Energy, Genre, Mode, PitchClass};
    use crate::sections::{plan_sections, SectionName};
    use std::collections::BTreeSet;

    fn intent() -> Intent {
        Intent {
            action: Action::New,
            genre: Genre::Pop,
            mode: Mode::Major,
            scale_name: None,
            root: PitchClass::C,
            requested_tempo: None,
            energy: Energy::Medium,
            emotions: BTreeSet::new(),
            styles: BTreeSet::new(),
            cultural_style: None,
            requested_track_count: None,
            explicit_instruments: None,
            duration: crate::duration::DurationRequest::default(),
        }
    }

    #[test]
    fn notes_stay_in_section_bounds() {
        let intent = intent();
        let ctx = GenContext::new(&intent, 0.1, 4);
        let sections = plan_sections(16, Energy::Medium);
        let section = sections.iter().find(|s| s.name == SectionName::Verse).unwrap();
        let mut variation = VariationEngine::from_seed(7);
        let notes = generate(section, &intent, &ctx, &mut variation);
        for n in &notes {
            assert!(n.start_time >= 0.0);
            assert!(n.start_time < section.bars() as f64 * 4.0);
            assert!(n.duration > 0.0);
            assert!((1..=127).contains(&n.velocity));
        }
    }
}
