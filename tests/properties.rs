//! Property tests for the for-all invariants in spec §8.

use proptest::prelude::*;

use midigen_core::config::PipelineConfig;
use midigen_core::duration::{self, DurationRequest, DurationUnit};
use midigen_core::intent::{Energy, Genre, Intent};

fn genre_strategy() -> impl Strategy<Value = Genre> {
    prop_oneof![
        Just(Genre::Pop),
        Just(Genre::Rock),
        Just(Genre::Jazz),
        Just(Genre::Classical),
        Just(Genre::Electronic),
        Just(Genre::Lofi),
        Just(Genre::Ambient),
        Just(Genre::Cinematic),
        Just(Genre::Funk),
        Just(Genre::Rnb),
    ]
}

fn energy_strategy() -> impl Strategy<Value = Energy> {
    prop_oneof![Just(Energy::Low), Just(Energy::Medium), Just(Energy::High)]
}

proptest! {
    #[test]
    fn duration_to_seconds_is_idempotent_for_canonical_seconds(
        seconds in 5.0f64..600.0,
        tempo in 60u32..200,
    ) {
        let req = DurationRequest { value: seconds, unit: DurationUnit::Seconds };
        let round_tripped = duration::to_seconds(req, tempo, 4);
        prop_assert!((round_tripped - seconds).abs() < 1e-9);

        let reparsed = duration::parse(&format!("{round_tripped} seconds")).unwrap();
        prop_assert!((duration::to_seconds(reparsed, tempo, 4) - round_tripped).abs() < 1e-6);
    }

    #[test]
    fn section_bars_always_sum_to_total(
        total_bars in 4u32..200,
        energy in energy_strategy(),
    ) {
        let sections = midigen_core::sections::plan_sections(total_bars, energy);
        let sum: u32 = sections.iter().map(|s| s.bars()).sum();
        prop_assert_eq!(sum, total_bars);
        prop_assert_eq!(sections.first().unwrap().start_bar, 0);
        prop_assert_eq!(sections.last().unwrap().end_bar, total_bars);
    }

    #[test]
    fn generated_notes_stay_within_bounds(
        genre in genre_strategy(),
        energy in energy_strategy(),
        track_count in 1u32..9,
        generation in 0u64..1000,
    ) {
        let mut intent = Intent::default_for(genre);
        intent.energy = energy;
        intent.requested_track_count = Some(track_count);
        intent.duration = DurationRequest { value: 16.0, unit: DurationUnit::Bars };

        let config = PipelineConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let outcome = midigen_core::generate(&intent, "prop-session", generation, Vec::new(), &config, dir.path());
        let midi_path = outcome.midi_path.expect("generation should not fail for any well-formed intent");

        let bytes = std::fs::read(&midi_path).unwrap();
        let smf = midly::Smf::parse(&bytes).unwrap();
        prop_assert_eq!(smf.tracks.len(), track_count as usize + 1);

        for track in smf.tracks.iter().skip(1) {
            for event in track {
                if let midly::TrackEventKind::Midi { message: midly::MidiMessage::NoteOn { key, vel }, .. } = event.kind {
                    if vel.as_int() > 0 {
                        prop_assert!(key.as_int() <= 127);
                    }
                }
            }
        }
    }
}
