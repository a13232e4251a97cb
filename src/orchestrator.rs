//! Orchestrator (C12, §4.12): owns the generation state and drives the
//! staged pipeline end to end. No other module holds a mutable reference
//! back into this one (§3, §9 "cyclic mutable references" re-architecture
//! note) — state flows down through function arguments and back up through
//! return values only.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::duration;
use crate::error::{CoreError, Severity};
use crate::generators::{self, GenContext, SectionChords};
use crate::humanize::humanize_track;
use crate::intent::{Intent, TrackType};
use crate::knowledge;
use crate::midi;
use crate::model::{CompositionState, GenerationOutcome, Issue, IssueKind, Note, QualityReport, Track, TrackConfig};
use crate::quality;
use crate::sections::{self, Section};
use crate::track_plan;
use crate::uniqueness::{self, SessionHistory};
use crate::variation::VariationEngine;

fn resolve_tempo(intent: &Intent) -> u32 {
    if let Some(tempo) = intent.requested_tempo {
        return tempo;
    }
    let profile = knowledge::genre_profile(intent.genre);
    let base = (profile.tempo_range.0 + profile.tempo_range.1) as f32 / 2.0;

    let mut multipliers: Vec<f32> = intent
        .emotions
        .iter()
        .map(|e| knowledge::emotion_profile(*e).tempo_multiplier)
        .collect();
    multipliers.extend(intent.styles.iter().map(|s| knowledge::style_profile(*s).tempo_multiplier));

    let avg_multiplier = if multipliers.is_empty() {
        1.0
    } else {
        multipliers.iter().sum::<f32>() / multipliers.len() as f32
    };

    (base * avg_multiplier).round().clamp(30.0, 300.0) as u32
}

/// Runs every generator across every section in dependency order
/// (`generators::GENERATION_ORDER`), producing one fully-populated `Track`
/// per planned `TrackConfig`, with note timings offset into the whole
/// composition's beat timeline.
fn generate_all_tracks(
    track_plan: &[TrackConfig],
    sections: &[Section],
    intent: &Intent,
    ctx: &GenContext,
    variation: &mut VariationEngine,
) -> Vec<Track> {
    let mut tracks: Vec<Track> = track_plan
        .iter()
        .map(|cfg| Track {
            name: format!("{} ({})", cfg.track_type.slug(), cfg.role),
            track_type: cfg.track_type,
            channel: cfg.channel,
            program: cfg.program,
            notes: Vec::new(),
        })
        .collect();

    let mut prev_chord: Vec<u8> = Vec::new();

    for section in sections {
        let chords: SectionChords = build_chords_if_needed(track_plan, section, intent, ctx, &mut prev_chord);
        let section_offset_beats = section.start_bar as f64 * ctx.beats_per_bar;
        let mut lead_notes: Vec<Note> = Vec::new();

        for &track_type in generators::GENERATION_ORDER.iter() {
            let Some((idx, cfg)) = track_plan
                .iter()
                .enumerate()
                .find(|(_, cfg)| cfg.track_type == track_type)
            else {
                continue;
            };

            let mut notes = generators::generate_for_track(
                cfg,
                section,
                intent,
                ctx,
                &chords,
                if track_type == TrackType::CounterMelody { Some(&lead_notes) } else { None },
                variation,
            );

            for note in notes.iter_mut() {
                note.start_time += section_offset_beats;
            }

            if track_type == TrackType::Lead {
                lead_notes = notes.clone();
                for note in lead_notes.iter_mut() {
                    note.start_time -= section_offset_beats;
                }
            }

            tracks[idx].notes.extend(notes);
        }
    }

    for track in tracks.iter_mut() {
        track.sort_notes();
    }
    tracks
}

fn build_chords_if_needed(
    track_plan: &[TrackConfig],
    section: &Section,
    intent: &Intent,
    ctx: &GenContext,
    prev_chord: &mut Vec<u8>,
) -> SectionChords {
    let needs_chords = track_plan.iter().any(|c| {
        matches!(c.track_type, TrackType::Harmony | TrackType::Bass | TrackType::Arpeggio | TrackType::Pad)
    });
    if needs_chords {
        generators::build_section_chords(section, intent, ctx, prev_chord)
    } else {
        SectionChords { per_bar: vec![Vec::new(); section.bars().max(1) as usize] }
    }
}

fn apply_targeted_refinement(
    working: &mut [Track],
    regenerate_types: &[TrackType],
    track_plan: &[TrackConfig],
    sections: &[Section],
    intent: &Intent,
    ctx: &GenContext,
    variation: &mut VariationEngine,
) {
    if regenerate_types.is_empty() {
        return;
    }
    let fresh = generate_all_tracks(track_plan, sections, intent, ctx, variation);
    for (idx, cfg) in track_plan.iter().enumerate() {
        if regenerate_types.contains(&cfg.track_type) {
            working[idx].notes = fresh[idx].notes.clone();
        }
    }
}

/// Public entry point: `Intent` plus prior-session fingerprints in, a
/// rendered MIDI file plus quality report out (§10.2).
pub fn generate(
    intent: &Intent,
    session_id: &str,
    generation_counter: u64,
    session_history: Vec<crate::model::CompositionSignature>,
    config: &PipelineConfig,
    out_dir: &Path,
) -> GenerationOutcome {
    let tempo_bpm = resolve_tempo(intent);

    let validated = duration::validate(
        intent.duration,
        tempo_bpm,
        config.beats_per_bar,
        config.min_duration_seconds,
        config.max_duration_seconds,
    );
    if let Some(warning) = &validated.warning {
        log::warn!("{warning}");
    }
    let total_bars = duration::to_bars(validated.request, tempo_bpm, config.beats_per_bar);

    let (track_plan, plan_issues) = track_plan::rule_based_plan(intent);
    for issue in &plan_issues {
        log::warn!("track planner: {}", issue.description);
    }
    let mut state = CompositionState {
        intent: intent.clone(),
        track_plan: track_plan.clone(),
        sections: Vec::new(),
        generated_tracks: Vec::new(),
        quality_report: None,
        refinement_attempts: 0,
        max_refinement_iterations: config.max_refinement_iterations,
        final_midi_path: None,
        error: None,
    };

    if track_plan.is_empty() {
        let err = CoreError::PlanError("no track types could be resolved from intent".into());
        state.error = Some(err.to_string());
        log::error!("fatal in stage `{}`: {err}", err.stage());
        return GenerationOutcome {
            midi_path: None,
            quality_report: QualityReport::fatal(&err),
            session_history,
        };
    }

    let sections = sections::plan_sections(total_bars, intent.energy);
    state.sections = sections.clone();
    let ctx = GenContext::new(intent, config.unison_guard_beats as f64, config.beats_per_bar);

    log::debug!("planned {} tracks across {} sections ({total_bars} bars)", track_plan.len(), sections.len());

    let mut variation = VariationEngine::initialize(session_id, generation_counter);
    let mut tracks = generate_all_tracks(&track_plan, &sections, intent, &ctx, &mut variation);
    for (track, cfg) in tracks.iter_mut().zip(track_plan.iter()) {
        let _ = cfg;
        humanize_track(track, ctx.beats_per_bar, intent.genre, &mut variation);
    }

    let actual_seconds = duration::to_seconds(validated.request, tempo_bpm, config.beats_per_bar);
    let mut report = quality::review(
        &tracks,
        &track_plan,
        &sections,
        intent,
        tempo_bpm,
        actual_seconds,
        actual_seconds,
        config.refinement_threshold,
    );

    let mut history = SessionHistory::from_signatures(session_history, config.session_history_capacity);
    let mut signature = uniqueness::compute_signature(&tracks, &sections, ctx.beats_per_bar, tempo_bpm, intent.genre);
    let mut repetition_issue = !history.accepts(&signature, config.uniqueness_threshold);

    // Shared `refinement_attempts` bound across both routers (spec §4.12's
    // router/router2): a uniqueness rejection loops back through
    // refinement → quality_reviewer just like a quality failure does, so
    // `report` never goes stale relative to the `tracks` it describes.
    while (report.needs_refinement || repetition_issue) && state.refinement_attempts < config.max_refinement_iterations {
        state.refinement_attempts += 1;
        log::debug!(
            "refinement pass {} (overall={:.2}, repetition_issue={repetition_issue})",
            state.refinement_attempts,
            report.overall
        );

        let mut refine_variation =
            VariationEngine::initialize(session_id, generation_counter + state.refinement_attempts as u64);
        if report.needs_refinement {
            let regenerate_types: Vec<TrackType> = report
                .suggestions
                .iter()
                .filter_map(|s| track_plan.get(s.track_index).map(|c| c.track_type))
                .collect();
            apply_targeted_refinement(
                &mut tracks,
                &regenerate_types,
                &track_plan,
                &sections,
                intent,
                &ctx,
                &mut refine_variation,
            );
        } else {
            tracks = generate_all_tracks(&track_plan, &sections, intent, &ctx, &mut refine_variation);
        }
        for track in tracks.iter_mut() {
            humanize_track(track, ctx.beats_per_bar, intent.genre, &mut refine_variation);
        }

        report = quality::review(
            &tracks,
            &track_plan,
            &sections,
            intent,
            tempo_bpm,
            actual_seconds,
            actual_seconds,
            config.refinement_threshold,
        );
        signature = uniqueness::compute_signature(&tracks, &sections, ctx.beats_per_bar, tempo_bpm, intent.genre);
        repetition_issue = !history.accepts(&signature, config.uniqueness_threshold);
    }

    if repetition_issue {
        let max_sim = history.max_similarity(&signature);
        log::warn!(
            "uniqueness guard: accepting best-effort composition after {} attempts, max similarity {max_sim:.2}",
            state.refinement_attempts
        );
        report.issues.push(Issue {
            track_index: None,
            kind: IssueKind::Repetition,
            severity: Severity::High,
            description: format!(
                "uniqueness guard still has similarity {max_sim:.2} to a prior session output after {} refinement attempts",
                state.refinement_attempts
            ),
        });
    }
    history.record(signature);

    state.generated_tracks = tracks.clone();
    state.quality_report = Some(report.clone());

    let out_path = midi::default_out_path(intent.genre, session_id, out_dir);
    if let Err(err) = midi::write_smf(&tracks, config.ppqn, tempo_bpm, &out_path) {
        state.error = Some(err.to_string());
        log::error!("fatal in stage `{}`: {err}", err.stage());
        return GenerationOutcome {
            midi_path: None,
            quality_report: QualityReport::fatal(&err),
            session_history: history.into_vec(),
        };
    }
    state.final_midi_path = Some(out_path.clone());

    log::debug!(
        "generation complete: refinement_attempts={}/{} overall={:.2} -> {}",
        state.refinement_attempts,
        state.max_refinement_iterations,
        report.overall,
        out_path.display()
    );

    GenerationOutcome {
        midi_path: Some(out_path),
        quality_report: report,
        session_history: history.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Genre;

    #[test]
    fn generates_a_playable_file_end_to_end() {
        let intent = Intent::default_for(Genre::Pop);
        let config = PipelineConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let outcome = generate(&intent, "test-session", 0, Vec::new(), &config, dir.path());
        assert!(outcome.midi_path.unwrap().exists());
        assert!(outcome.quality_report.overall >= 0.0);
    }

    #[test]
    fn distinct_calls_produce_distinct_signatures() {
        let intent = Intent::default_for(Genre::Electronic);
        let config = PipelineConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let first = generate(&intent, "session-a", 0, Vec::new(), &config, dir.path());
        let second = generate(&intent, "session-a", 1, first.session_history.clone(), &config, dir.path());
        assert_ne!(
            first.session_history.last().unwrap().overall,
            second.session_history.last().unwrap().overall
        );
    }
}
