//! Quality Reviewer (C9, §4.9): computes six subscores against the intent
//! and emits refinement directives.

use std::collections::HashMap;

use crate::error::Severity;
use crate::intent::{Intent, Mode, TrackType};
use crate::knowledge::{self, emotion_profile};
use crate::model::{Issue, IssueKind, QualityReport, Suggestion, Track, TrackConfig};
use crate::sections::Section;

pub const REFINEMENT_THRESHOLD: f32 = 0.75;

const WEIGHT_MELODIC: f32 = 0.20;
const WEIGHT_HARMONIC: f32 = 0.20;
const WEIGHT_RHYTHMIC: f32 = 0.15;
const WEIGHT_STRUCTURAL: f32 = 0.15;
const WEIGHT_TIMBRAL: f32 = 0.10;
const WEIGHT_EMOTIONAL: f32 = 0.20;

pub fn review(
    tracks: &[Track],
    track_plan: &[TrackConfig],
    sections: &[Section],
    intent: &Intent,
    tempo_bpm: u32,
    actual_seconds: f64,
    requested_seconds: f64,
    refinement_threshold: f32,
) -> QualityReport {
    let mut issues = Vec::new();

    let melodic = melodic_score(tracks);
    let harmonic = harmonic_score(tracks);
    let rhythmic = rhythmic_score(tracks, intent);
    let structural = structural_score(sections, actual_seconds, requested_seconds);
    let timbral = timbral_score(tracks, track_plan, intent, &mut issues);
    let (emotional, hard_violation) = emotional_score(intent, tempo_bpm, &mut issues);
    let missing_instrument = missing_instrument_issue(intent, track_plan, &mut issues);

    density_issues(tracks, sections, &mut issues);

    let overall = WEIGHT_MELODIC * melodic
        + WEIGHT_HARMONIC * harmonic
        + WEIGHT_RHYTHMIC * rhythmic
        + WEIGHT_STRUCTURAL * structural
        + WEIGHT_TIMBRAL * timbral
        + WEIGHT_EMOTIONAL * emotional;

    let needs_refinement = hard_violation || missing_instrument || overall < refinement_threshold;

    let suggestions = build_suggestions(&issues, tracks);

    QualityReport {
        melodic,
        harmonic,
        rhythmic,
        structural,
        timbral,
        emotional,
        overall,
        issues,
        needs_refinement,
        suggestions,
    }
}

fn is_melodic(track_type: TrackType) -> bool {
    matches!(track_type, TrackType::Lead | TrackType::CounterMelody)
}

fn pitch_range_score(notes: &[crate::model::Note]) -> f32 {
    if notes.len() < 2 {
        return 0.0;
    }
    let min = notes.iter().map(|n| n.pitch).min().unwrap();
    let max = notes.iter().map(|n| n.pitch).max().unwrap();
    let range = (max - min) as f32;
    ((range.clamp(12.0, 48.0) - 12.0) / 36.0).clamp(0.0, 1.0)
}

fn contour_interest_score(notes: &[crate::model::Note]) -> f32 {
    if notes.len() < 3 {
        return 0.5;
    }
    let pitches: Vec<f64> = notes.iter().map(|n| n.pitch as f64).collect();
    let mean = pitches.iter().sum::<f64>() / pitches.len() as f64;
    let centered: Vec<f64> = pitches.iter().map(|p| p - mean).collect();
    let denom: f64 = centered.iter().map(|c| c * c).sum();
    if denom < f64::EPSILON {
        return 0.0;
    }
    let numer: f64 = centered.windows(2).map(|w| w[0] * w[1]).sum();
    let autocorr = numer / denom;
    (1.0 - autocorr.abs()).clamp(0.0, 1.0) as f32
}

fn interval_variety_score(notes: &[crate::model::Note]) -> f32 {
    if notes.len() < 2 {
        return 0.0;
    }
    let intervals: Vec<i32> = notes.windows(2).map(|w| w[1].pitch as i32 - w[0].pitch as i32).collect();
    let distinct: std::collections::HashSet<i32> = intervals.iter().copied().collect();
    distinct.len() as f32 / intervals.len() as f32
}

fn melodic_score(tracks: &[Track]) -> f32 {
    let melodic_tracks: Vec<&Track> = tracks.iter().filter(|t| is_melodic(t.track_type)).collect();
    if melodic_tracks.is_empty() {
        return 0.3;
    }
    let mut total = 0.0;
    for t in &melodic_tracks {
        let range = pitch_range_score(&t.notes);
        let contour = contour_interest_score(&t.notes);
        let variety = interval_variety_score(&t.notes);
        total += (range + contour + variety) / 3.0;
    }
    total / melodic_tracks.len() as f32
}

fn group_chords(notes: &[crate::model::Note]) -> Vec<Vec<u8>> {
    let mut groups: HashMap<u64, Vec<u8>> = HashMap::new();
    for n in notes {
        let key = (n.start_time * 1000.0).round() as u64;
        groups.entry(key).or_default().push(n.pitch);
    }
    let mut keys: Vec<u64> = groups.keys().copied().collect();
    keys.sort_unstable();
    keys.into_iter()
        .map(|k| {
            let mut pitches = groups.remove(&k).unwrap();
            pitches.sort_unstable();
            pitches
        })
        .collect()
}

fn harmonic_score(tracks: &[Track]) -> f32 {
    let Some(harmony) = tracks.iter().find(|t| t.track_type == TrackType::Harmony) else {
        return 0.4;
    };
    let chords = group_chords(&harmony.notes);
    if chords.len() < 2 {
        return 0.4;
    }

    let roots: Vec<u8> = chords.iter().filter_map(|c| c.first().copied()).collect();
    let distinct_roots: std::collections::HashSet<u8> = roots.iter().map(|r| r % 12).collect();
    let variety = distinct_roots.len() as f32 / roots.len().max(1) as f32;

    let mut total_motion = 0.0;
    let mut comparisons = 0;
    for w in chords.windows(2) {
        let motion: i32 = w[0]
            .iter()
            .zip(w[1].iter())
            .map(|(a, b)| (*a as i32 - *b as i32).abs())
            .sum();
        total_motion += motion as f32 / w[0].len().max(1) as f32;
        comparisons += 1;
    }
    let mean_motion = if comparisons > 0 { total_motion / comparisons as f32 } else { 0.0 };
    let smoothness = (1.0 - mean_motion / 12.0).clamp(0.0, 1.0);

    (variety + smoothness) / 2.0
}

fn rhythmic_score(tracks: &[Track], intent: &Intent) -> f32 {
    let target = knowledge::genre_profile(intent.genre).rhythmic_target;
    let grid = 0.25; // sixteenth-note grid
    let tolerance = 0.06;

    let onsets: Vec<f64> = tracks
        .iter()
        .filter(|t| t.track_type != TrackType::Fx)
        .flat_map(|t| t.notes.iter().map(|n| n.start_time))
        .collect();
    if onsets.is_empty() {
        return 0.5;
    }
    let on_grid = onsets
        .iter()
        .filter(|&&t| {
            let nearest = (t / grid).round() * grid;
            (t - nearest).abs() < tolerance
        })
        .count();
    let observed_regularity = on_grid as f32 / onsets.len() as f32;
    1.0 - (observed_regularity - target).abs()
}

fn structural_score(sections: &[Section], actual_seconds: f64, requested_seconds: f64) -> f32 {
    let duration_fit = if requested_seconds > 0.0 {
        let deviation = (actual_seconds - requested_seconds).abs() / requested_seconds;
        (1.0 - (deviation as f32 / 0.05)).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let envelope_fit = if sections.is_empty() {
        0.0
    } else {
        let mut total = 0.0;
        for s in sections {
            let (base_e, base_d) = crate::sections::base_targets(s.name);
            let err = (s.energy_level - base_e).abs() + (s.density_level - base_d).abs();
            total += (1.0 - err / 2.0).clamp(0.0, 1.0);
        }
        total / sections.len() as f32
    };

    (duration_fit + envelope_fit) / 2.0
}

fn timbral_score(tracks: &[Track], track_plan: &[TrackConfig], intent: &Intent, issues: &mut Vec<Issue>) -> f32 {
    let families: std::collections::HashSet<_> = track_plan
        .iter()
        .filter_map(|t| knowledge::instrument_by_key(&t.instrument_key))
        .map(|i| format!("{:?}", i.family))
        .collect();
    let diversity = if tracks.is_empty() {
        0.0
    } else {
        (families.len() as f32 / tracks.len() as f32).min(1.0)
    };

    let mut penalty = 0.0;
    if let Some(requested) = intent.requested_track_count {
        let requested = requested.clamp(1, 8);
        if (tracks.len() as u32) < requested {
            penalty = 0.3;
            issues.push(Issue {
                track_index: None,
                kind: IssueKind::IntentMismatch,
                severity: Severity::High,
                description: format!(
                    "track count {} below requested {requested}",
                    tracks.len()
                ),
            });
        }
    }

    (diversity - penalty).clamp(0.0, 1.0)
}

fn emotional_score(intent: &Intent, tempo_bpm: u32, issues: &mut Vec<Issue>) -> (f32, bool) {
    let genre_profile = knowledge::genre_profile(intent.genre);
    let mut hard_violation = false;

    let genre_tempo_ok = tempo_bpm >= genre_profile.tempo_range.0.saturating_sub(15)
        && tempo_bpm <= genre_profile.tempo_range.1 + 15;
    if !genre_tempo_ok {
        hard_violation = true;
        issues.push(Issue {
            track_index: None,
            kind: IssueKind::IntentMismatch,
            severity: Severity::High,
            description: format!(
                "tempo {tempo_bpm} is outside the {:?} genre's expected range {:?}",
                intent.genre, genre_profile.tempo_range
            ),
        });
    }

    let mut emotion_hits = 0usize;
    let mut emotion_total = 0usize;
    for emotion in &intent.emotions {
        let profile = emotion_profile(*emotion);
        emotion_total += 1;
        let center = (genre_profile.tempo_range.0 + genre_profile.tempo_range.1) as f32 / 2.0;
        let expected = center * profile.tempo_multiplier;
        if (tempo_bpm as f32 - expected).abs() <= expected * 0.25 {
            emotion_hits += 1;
        }
        if let Some(expected_mode) = profile.mode_preference {
            if expected_mode == intent.mode {
                emotion_hits += 1;
            }
            emotion_total += 1;
        }
    }

    let mode_tempo_fit = if emotion_total == 0 {
        0.7
    } else {
        emotion_hits as f32 / emotion_total as f32
    };

    let score = if genre_tempo_ok { mode_tempo_fit } else { mode_tempo_fit * 0.5 };
    (score.clamp(0.0, 1.0), hard_violation)
}

/// Third hard violation from spec.md:110: a requested instrument that never
/// resolved into the track plan (either never matched in `knowledge`, or
/// dropped by `track_plan::rule_based_plan`'s `filter_map`).
fn missing_instrument_issue(intent: &Intent, track_plan: &[TrackConfig], issues: &mut Vec<Issue>) -> bool {
    let Some(requested) = &intent.explicit_instruments else {
        return false;
    };
    let resolved: std::collections::HashSet<&str> = track_plan.iter().map(|t| t.instrument_key.as_str()).collect();
    let mut hard_violation = false;
    for key in requested {
        if !resolved.contains(key.as_str()) {
            hard_violation = true;
            issues.push(Issue {
                track_index: None,
                kind: IssueKind::IntentMismatch,
                severity: Severity::High,
                description: format!("requested instrument `{key}` did not resolve into the track plan"),
            });
        }
    }
    hard_violation
}

fn density_issues(tracks: &[Track], sections: &[Section], issues: &mut Vec<Issue>) {
    for (idx, track) in tracks.iter().enumerate() {
        if track.notes.is_empty() {
            let non_outro_sections = sections
                .iter()
                .any(|s| s.name != crate::sections::SectionName::Outro);
            if non_outro_sections {
                issues.push(Issue {
                    track_index: Some(idx),
                    kind: IssueKind::Density,
                    severity: Severity::Medium,
                    description: format!("track {idx} ({:?}) produced no notes", track.track_type),
                });
            }
        }
    }
}

fn build_suggestions(issues: &[Issue], tracks: &[Track]) -> Vec<Suggestion> {
    issues
        .iter()
        .filter_map(|issue| {
            let track_index = issue.track_index?;
            if track_index >= tracks.len() {
                return None;
            }
            let directive = match issue.kind {
                IssueKind::Density => format!(
                    "regenerate track {track_index} with higher density, target 0.8"
                ),
                IssueKind::Diversity => format!("regenerate track {track_index} with more interval variety"),
                IssueKind::Velocity => format!("regenerate track {track_index} with wider dynamic range"),
                IssueKind::Balance => format!("rebalance track {track_index} against the rest of the mix"),
                IssueKind::IntentMismatch => format!("regenerate track {track_index} to better match requested instrumentation"),
                IssueKind::Repetition => format!("regenerate track {track_index} with a fresh motif seed"),
                IssueKind::Fatal => unreachable!("fatal issues always carry track_index: None"),
            };
            Some(Suggestion { track_index, directive })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Note;

    #[test]
    fn melodic_score_zero_for_flat_single_note() {
        let track = Track {
            name: "lead".into(),
            track_type: TrackType::Lead,
            channel: 0,
            program: 0,
            notes: vec![Note { pitch: 60, start_time: 0.0, duration: 1.0, velocity: 80 }],
        };
        let score = melodic_score(&[track]);
        assert!(score < 0.4);
    }

    #[test]
    fn missing_requested_instrument_is_a_hard_violation() {
        let mut intent = Intent::default_for(crate::intent::Genre::Pop);
        intent.explicit_instruments = Some(vec!["nonexistent_instrument".into()]);
        let track_plan = vec![TrackConfig {
            track_type: TrackType::Lead,
            instrument_key: "grand_piano".into(),
            program: 0,
            role: "lead".into(),
            priority: 0,
            channel: 0,
        }];
        let mut issues = Vec::new();
        let hard_violation = missing_instrument_issue(&intent, &track_plan, &mut issues);
        assert!(hard_violation);
        assert!(issues.iter().any(|i| i.kind == IssueKind::IntentMismatch));
    }

    #[test]
    fn empty_track_flags_density_issue_outside_outro() {
        let track = Track {
            name: "lead".into(),
            track_type: TrackType::Lead,
            channel: 0,
            program: 0,
            notes: vec![],
        };
        let sections = crate::sections::plan_sections(16, crate::intent::Energy::Medium);
        let mut issues = Vec::new();
        density_issues(&[track], &sections, &mut issues);
        assert!(issues.iter().any(|i| i.kind == IssueKind::Density));
    }
}
