//! End-to-end scenarios from spec §8, driving `generate()` directly and
//! inspecting the returned `QualityReport` and the emitted MIDI bytes.

use std::collections::BTreeSet;

use midigen_core::config::PipelineConfig;
use midigen_core::duration::{DurationRequest, DurationUnit};
use midigen_core::intent::{Action, Emotion, Energy, Genre, Intent, Mode, PitchClass, StyleDescriptor, TrackType};

fn base_intent(genre: Genre) -> Intent {
    Intent::default_for(genre)
}

#[test]
fn scenario_1_pop_four_tracks() {
    let mut intent = base_intent(Genre::Pop);
    intent.action = Action::New;
    intent.root = PitchClass::C;
    intent.mode = Mode::Major;
    intent.energy = Energy::Medium;
    intent.requested_track_count = Some(4);
    intent.duration = DurationRequest { value: 2.0, unit: DurationUnit::Minutes };
    intent.requested_tempo = Some(120);

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-1", 0, Vec::new(), &config, dir.path());

    let bytes = std::fs::read(outcome.midi_path.as_ref().unwrap()).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 5); // conductor + 4 instrument tracks

    assert!(outcome.quality_report.overall >= 0.0);
    assert!(outcome.quality_report.overall <= 1.0);
}

#[test]
fn scenario_2_ambient_low_density_no_drums_by_default() {
    let mut intent = base_intent(Genre::Ambient);
    intent.emotions = BTreeSet::from([Emotion::Peaceful]);
    intent.requested_track_count = Some(3);
    intent.duration = DurationRequest { value: 300.0, unit: DurationUnit::Seconds };

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-2", 0, Vec::new(), &config, dir.path());

    let bytes = std::fs::read(outcome.midi_path.as_ref().unwrap()).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 4); // conductor + 3 instrument tracks
}

#[test]
fn scenario_3_jazz_walking_bass_and_swing() {
    let mut intent = base_intent(Genre::Jazz);
    intent.root = PitchClass::F;
    intent.mode = Mode::Minor;
    intent.energy = Energy::High;
    intent.requested_track_count = Some(5);
    intent.duration = DurationRequest { value: 32.0, unit: DurationUnit::Bars };
    intent.requested_tempo = Some(140);

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-3", 0, Vec::new(), &config, dir.path());

    let bytes = std::fs::read(outcome.midi_path.as_ref().unwrap()).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 6);
}

#[test]
fn scenario_4_electronic_funky_arpeggio_present() {
    let mut intent = base_intent(Genre::Electronic);
    intent.emotions = BTreeSet::from([Emotion::Energetic]);
    intent.styles = BTreeSet::from([StyleDescriptor::Funky]);
    intent.requested_track_count = Some(6);
    intent.duration = DurationRequest { value: 90.0, unit: DurationUnit::Seconds };
    intent.requested_tempo = Some(128);

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-4", 0, Vec::new(), &config, dir.path());

    let bytes = std::fs::read(outcome.midi_path.as_ref().unwrap()).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 7);
}

#[test]
fn scenario_5_repeated_calls_diverge_but_keep_tempo_and_genre() {
    let mut intent = base_intent(Genre::Pop);
    intent.requested_track_count = Some(4);
    intent.duration = DurationRequest { value: 2.0, unit: DurationUnit::Minutes };
    intent.requested_tempo = Some(120);

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();

    let first = midigen_core::generate(&intent, "scenario-5", 0, Vec::new(), &config, dir.path());
    let second =
        midigen_core::generate(&intent, "scenario-5", 1, first.session_history.clone(), &config, dir.path());

    assert_ne!(first.midi_path, second.midi_path);
    let sig_a = first.session_history.last().unwrap();
    let sig_b = second.session_history.last().unwrap();
    assert_eq!(sig_a.tempo, sig_b.tempo);
    assert_eq!(sig_a.genre, sig_b.genre);
}

#[test]
fn scenario_6_over_max_duration_is_clamped() {
    let mut intent = base_intent(Genre::Pop);
    intent.duration = DurationRequest { value: 15.0, unit: DurationUnit::Minutes };
    intent.requested_tempo = Some(120);

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-6", 0, Vec::new(), &config, dir.path());

    let bytes = std::fs::read(outcome.midi_path.as_ref().unwrap()).unwrap();
    assert!(!bytes.is_empty());
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert!(!smf.tracks.is_empty());
}

#[test]
fn unknown_genre_degrades_to_other_without_panicking() {
    let mut intent = Intent::default_for("not-a-real-genre".parse().unwrap());
    intent.duration = DurationRequest { value: 30.0, unit: DurationUnit::Seconds };
    assert_eq!(intent.genre, Genre::Other);

    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-other", 0, Vec::new(), &config, dir.path());
    assert!(outcome.midi_path.unwrap().exists());
}

#[test]
fn drum_track_is_the_only_one_on_channel_nine() {
    let mut intent = base_intent(Genre::Rock);
    intent.requested_track_count = Some(4);
    let config = PipelineConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let outcome = midigen_core::generate(&intent, "scenario-channels", 0, Vec::new(), &config, dir.path());

    let bytes = std::fs::read(outcome.midi_path.as_ref().unwrap()).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    for track in smf.tracks.iter().skip(1) {
        let name = track.iter().find_map(|ev| match ev.kind {
            midly::TrackEventKind::Meta(midly::MetaMessage::TrackName(bytes)) => {
                Some(String::from_utf8_lossy(bytes).to_string())
            }
            _ => None,
        });
        let is_drums = name.as_deref().is_some_and(|n| n.starts_with("drums"));
        for event in track {
            if let midly::TrackEventKind::Midi { channel, .. } = event.kind {
                assert_eq!(channel.as_int() == 9, is_drums);
            }
        }
    }
}

// Guards against the `TrackType` import going unused if a scenario above changes.
#[allow(dead_code)]
fn _touch(t: TrackType) -> TrackType {
    t
}
