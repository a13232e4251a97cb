//! Track Planner (§4.6): produces the ordered list of `TrackConfig`s from
//! intent. Exposed as a `plan_tracks` hook per §9 so the default rule-based
//! implementation can be swapped for an externally supplied planning
//! function (e.g. LLM-augmented planning, kept strictly outside the core).

use crate::error::Severity;
use crate::intent::{Genre, Intent, TrackType};
use crate::knowledge::{self, InstrumentFamily};
use crate::model::{Issue, IssueKind, TrackConfig};

/// Signature every track-planning function must satisfy (§9's `plan_tracks`
/// hook contract). The default implementation is `rule_based_plan`.
pub type PlanTracksFn = fn(&Intent) -> (Vec<TrackConfig>, Vec<Issue>);

const DEFAULT_TRACK_TYPES: [TrackType; 4] =
    [TrackType::Lead, TrackType::Harmony, TrackType::Bass, TrackType::Drums];

/// Rule-based default track planner (§4.6 algorithm, steps 1-3).
pub fn rule_based_plan(intent: &Intent) -> (Vec<TrackConfig>, Vec<Issue>) {
    let mut issues = Vec::new();

    let mut types: Vec<TrackType> = if let Some(instruments) = &intent.explicit_instruments {
        instruments
            .iter()
            .filter_map(|key| knowledge::instrument_by_key(key))
            .map(|instrument| knowledge::track_type_for_family(instrument.family))
            .collect()
    } else {
        augmented_default_set(intent)
    };

    if types.is_empty() {
        types = DEFAULT_TRACK_TYPES.to_vec();
    }

    if let Some(requested) = intent.requested_track_count {
        let clamped = requested.clamp(1, 8);
        if requested != clamped {
            issues.push(Issue {
                track_index: None,
                kind: IssueKind::IntentMismatch,
                severity: Severity::Medium,
                description: format!(
                    "requested_track_count={requested} out of range [1,8], clamped to {clamped}"
                ),
            });
        }
        pad_or_truncate(&mut types, clamped as usize);
    }

    let mut configs = Vec::with_capacity(types.len());
    let mut next_channel = 0u8;
    for (priority, track_type) in types.into_iter().enumerate() {
        let (instrument_key, program) = resolve_instrument_for(intent, track_type, priority, &intent.explicit_instruments);
        let channel = if track_type == TrackType::Drums {
            9
        } else {
            let assigned = next_channel;
            next_channel = (next_channel + 1) % 16;
            if next_channel == 9 {
                next_channel = (next_channel + 1) % 16;
            }
            assigned
        };
        configs.push(TrackConfig {
            track_type,
            instrument_key,
            program,
            role: default_role(track_type),
            priority: priority as u32 + 1,
            channel,
        });
    }

    (configs, issues)
}

fn resolve_instrument_for(
    intent: &Intent,
    track_type: TrackType,
    priority: usize,
    explicit: &Option<Vec<String>>,
) -> (String, u8) {
    if let Some(instruments) = explicit {
        if let Some(key) = instruments.get(priority) {
            if let Some(instrument) = knowledge::instrument_by_key(key) {
                return (instrument.key.to_string(), instrument.program);
            }
        }
    }
    let instrument = knowledge::resolve_instrument(track_type, intent.genre, &intent.emotions, &intent.styles);
    (instrument.key.to_string(), instrument.program)
}

fn default_role(track_type: TrackType) -> String {
    match track_type {
        TrackType::Lead => "primary melodic line",
        TrackType::CounterMelody => "secondary melodic counterpoint",
        TrackType::Harmony => "chordal accompaniment",
        TrackType::Bass => "low-register foundation",
        TrackType::Drums => "rhythmic foundation",
        TrackType::Arpeggio => "broken-chord texture",
        TrackType::Pad => "sustained harmonic bed",
        TrackType::Fx => "sparse textural accent",
    }
    .to_string()
}

/// Default set augmented by emotion/style-driven additions (§4.6 step 2):
/// genres/emotions/styles whose strongest instrument affinities point at a
/// pad or arpeggio-suited family pull those track types in ahead of the
/// padding order.
fn augmented_default_set(intent: &Intent) -> Vec<TrackType> {
    let mut types = DEFAULT_TRACK_TYPES.to_vec();

    let wants_pad = intent.styles.iter().any(|s| {
        matches!(
            s,
            crate::intent::StyleDescriptor::Ambient | crate::intent::StyleDescriptor::Ethereal
        )
    }) || intent.genre == Genre::Ambient
        || intent.genre == Genre::Cinematic;

    let wants_arpeggio = intent.genre == Genre::Electronic
        || intent
            .styles
            .contains(&crate::intent::StyleDescriptor::Rhythmic);

    if wants_pad && !types.contains(&TrackType::Pad) {
        types.push(TrackType::Pad);
    }
    if wants_arpeggio && !types.contains(&TrackType::Arpeggio) {
        types.push(TrackType::Arpeggio);
    }
    types
}

/// Pads with `TrackType::padding_order()` or truncates by dropping the
/// highest-priority-number (least important, i.e. last) entries until
/// `types.len() == target` exactly (§4.6 step 3).
fn pad_or_truncate(types: &mut Vec<TrackType>, target: usize) {
    for &candidate in TrackType::padding_order() {
        if types.len() >= target {
            break;
        }
        if !types.contains(&candidate) {
            types.push(candidate);
        }
    }
    types.truncate(target);
}

#[allow(dead_code)]
fn _assert_family(family: InstrumentFamily) -> InstrumentFamily {
    family
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::DurationRequest;
    use std::collections::BTreeSet;

    fn base_intent(genre: Genre) -> Intent {
        Intent {
            action: crate::intent::Action::New,
            genre,
            mode: crate::intent::Mode::Major,
            scale_name: None,
            root: crate::intent::PitchClass::C,
            requested_tempo: None,
            energy: crate::intent::Energy::Medium,
            emotions: BTreeSet::new(),
            styles: BTreeSet::new(),
            cultural_style: None,
            requested_track_count: None,
            explicit_instruments: None,
            duration: DurationRequest::default(),
        }
    }

    #[test]
    fn default_plan_has_four_tracks() {
        let (tracks, issues) = rule_based_plan(&base_intent(Genre::Pop));
        assert_eq!(tracks.len(), 4);
        assert!(issues.is_empty());
    }

    #[test]
    fn drums_always_channel_nine() {
        let (tracks, _) = rule_based_plan(&base_intent(Genre::Rock));
        for t in &tracks {
            if t.track_type == TrackType::Drums {
                assert_eq!(t.channel, 9);
            } else {
                assert_ne!(t.channel, 9);
            }
        }
    }

    #[test]
    fn priorities_are_unique() {
        let (tracks, _) = rule_based_plan(&base_intent(Genre::Jazz));
        let mut priorities: Vec<u32> = tracks.iter().map(|t| t.priority).collect();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), tracks.len());
    }

    #[test]
    fn requested_count_clamped_above_eight() {
        let mut intent = base_intent(Genre::Electronic);
        intent.requested_track_count = Some(15);
        let (tracks, issues) = rule_based_plan(&intent);
        assert_eq!(tracks.len(), 8);
        assert!(issues.iter().any(|i| i.kind == IssueKind::IntentMismatch));
    }

    #[test]
    fn requested_count_clamped_below_one() {
        let mut intent = base_intent(Genre::Pop);
        intent.requested_track_count = Some(0);
        let (tracks, issues) = rule_based_plan(&intent);
        assert_eq!(tracks.len(), 1);
        assert!(issues.iter().any(|i| i.kind == IssueKind::IntentMismatch));
    }

    #[test]
    fn exact_requested_count_honored() {
        let mut intent = base_intent(Genre::Pop);
        intent.requested_track_count = Some(6);
        let (tracks, _) = rule_based_plan(&intent);
        assert_eq!(tracks.len(), 6);
    }
}
