//! MIDI Serializer (C11, §4.11): renders the generated tracks to a Standard
//! MIDI File, type 1, 480 PPQN — conductor track 0 plus one track per part.

use std::path::{Path, PathBuf};

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track as MidlyTrack, TrackEvent, TrackEventKind};

use crate::error::CoreError;
use crate::intent::Genre;
use crate::model::Track;

const DRUM_CHANNEL: u8 = 9;

fn bpm_to_us_per_quarter(bpm: u32) -> u32 {
    60_000_000u32 / bpm.max(1)
}

fn event_order_key(kind: &TrackEventKind) -> u8 {
    match kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOff { .. } => 0,
            MidiMessage::NoteOn { .. } => 1,
            _ => 2,
        },
        TrackEventKind::Meta(_) => 3,
        TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => 4,
    }
}

fn conductor_track<'a>(ppqn: u16, tempo_bpm: u32) -> MidlyTrack<'a> {
    let us_per_qn = bpm_to_us_per_quarter(tempo_bpm);
    let mut track = vec![
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_qn.into())),
        },
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        },
    ];
    let _ = ppqn;
    track.push(TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) });
    track
}

fn instrument_track<'a>(track: &'a Track, beats_per_tick_scale: f64) -> MidlyTrack<'a> {
    let channel = if track.track_type == crate::intent::TrackType::Drums {
        DRUM_CHANNEL
    } else {
        track.channel
    };

    let mut abs_events: Vec<(u32, TrackEventKind<'a>)> = Vec::new();
    abs_events.push((
        0,
        TrackEventKind::Midi {
            channel: channel.into(),
            message: MidiMessage::ProgramChange { program: track.program.into() },
        },
    ));

    for note in &track.notes {
        if !note.is_valid() {
            continue;
        }
        let start_tick = (note.start_time * beats_per_tick_scale).round() as u32;
        let end_tick = ((note.start_time + note.duration) * beats_per_tick_scale).round() as u32;
        let end_tick = end_tick.max(start_tick + 1);

        abs_events.push((
            start_tick,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn { key: note.pitch.into(), vel: note.velocity.into() },
            },
        ));
        abs_events.push((
            end_tick,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOff { key: note.pitch.into(), vel: 0.into() },
            },
        ));
    }

    abs_events.sort_by(|(ta, ea), (tb, eb)| ta.cmp(tb).then_with(|| event_order_key(ea).cmp(&event_order_key(eb))));

    let mut events: Vec<TrackEvent<'a>> = Vec::with_capacity(abs_events.len() + 2);
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
    });
    let mut last_tick = 0u32;
    for (tick, kind) in abs_events {
        let delta = tick.saturating_sub(last_tick);
        last_tick = tick;
        events.push(TrackEvent { delta: delta.into(), kind });
    }
    events.push(TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) });
    events
}

/// Builds and writes the Standard MIDI File, returning its path. `ppqn` is
/// the pulses-per-quarter-note resolution from `PipelineConfig`.
pub fn write_smf(tracks: &[Track], ppqn: u16, tempo_bpm: u32, out_path: &Path) -> Result<(), CoreError> {
    let header = Header::new(Format::Parallel, Timing::Metrical(ppqn.into()));

    let mut smf_tracks = Vec::with_capacity(tracks.len() + 1);
    smf_tracks.push(conductor_track(ppqn, tempo_bpm));
    for track in tracks {
        smf_tracks.push(instrument_track(track, ppqn as f64));
    }

    let smf = Smf { header, tracks: smf_tracks };

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::SerializationError(e.to_string()))?;
    }
    smf.save(out_path).map_err(|e| CoreError::SerializationError(e.to_string()))?;
    Ok(())
}

/// `midigen_{genre}_{session_id_8}_{YYYYMMDD_HHMMSS}.mid`, per §10.4.
pub fn default_out_path(genre: Genre, session_id: &str, out_dir: &Path) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let short_session: String = session_id.chars().take(8).collect();
    out_dir.join(format!("midigen_{}_{short_session}_{ts}.mid", genre.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TrackType;
    use crate::model::Note;
    use tempfile::tempdir;

    #[test]
    fn writes_readable_smf() {
        let track = Track {
            name: "lead".into(),
            track_type: TrackType::Lead,
            channel: 0,
            program: 0,
            notes: vec![Note { pitch: 60, start_time: 0.0, duration: 1.0, velocity: 90 }],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mid");
        write_smf(&[track], 480, 120, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);
    }

    #[test]
    fn drum_track_forced_to_channel_nine() {
        let track = Track {
            name: "drums".into(),
            track_type: TrackType::Drums,
            channel: 3,
            program: 0,
            notes: vec![Note { pitch: 36, start_time: 0.0, duration: 0.25, velocity: 100 }],
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("drums.mid");
        write_smf(&[track], 480, 120, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let found_channel_nine = smf.tracks[1].iter().any(|ev| {
            matches!(ev.kind, TrackEventKind::Midi { channel, .. } if channel.as_int() == 9)
        });
        assert!(found_channel_nine);
    }
}
