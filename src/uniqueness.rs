//! Uniqueness Guard (C10, §4.10): fingerprints a composition and rejects it
//! if it is too similar to anything still in the session history.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use crate::intent::{Genre, TrackType};
use crate::model::{CompositionSignature, Track};
use crate::sections::Section;

fn hash_seq<T: Hash>(items: &[T]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for item in items {
        item.hash(&mut hasher);
    }
    hasher.finish()
}

fn bucket(value: f32, buckets: u32) -> u32 {
    (value.clamp(0.0, 1.0) * buckets as f32).round() as u32
}

/// One hash per bar of the lead/counter-melody pitch-class sequence.
fn melody_hashes(tracks: &[Track], beats_per_bar: f64, total_bars: u32) -> Vec<u64> {
    let melodic: Vec<&Track> = tracks
        .iter()
        .filter(|t| matches!(t.track_type, TrackType::Lead | TrackType::CounterMelody))
        .collect();
    bar_hashes(&melodic, beats_per_bar, total_bars, |n| n.pitch % 12)
}

fn harmony_hashes(tracks: &[Track], beats_per_bar: f64, total_bars: u32) -> Vec<u64> {
    let harmony: Vec<&Track> = tracks.iter().filter(|t| t.track_type == TrackType::Harmony).collect();
    bar_hashes(&harmony, beats_per_bar, total_bars, |n| n.pitch % 12)
}

fn rhythm_hashes(tracks: &[Track], beats_per_bar: f64, total_bars: u32) -> Vec<u64> {
    bar_hashes(&tracks.iter().collect::<Vec<_>>(), beats_per_bar, total_bars, |n| {
        ((n.start_time % 1.0) * 16.0).round() as u8 as u32
    })
}

fn bar_hashes<F: Fn(&crate::model::Note) -> u32>(
    tracks: &[&Track],
    beats_per_bar: f64,
    total_bars: u32,
    project: F,
) -> Vec<u64> {
    let mut bars = vec![Vec::new(); total_bars as usize];
    for track in tracks {
        for note in &track.notes {
            let bar = (note.start_time / beats_per_bar).floor() as i64;
            if bar >= 0 && (bar as u32) < total_bars {
                bars[bar as usize].push(project(note));
            }
        }
    }
    bars.iter()
        .map(|values| {
            let mut sorted = values.clone();
            sorted.sort_unstable();
            hash_seq(&sorted)
        })
        .collect()
}

fn structure_hashes(sections: &[Section]) -> Vec<u64> {
    sections
        .iter()
        .map(|s| {
            let mut hasher = DefaultHasher::new();
            format!("{:?}", s.name).hash(&mut hasher);
            s.bars().hash(&mut hasher);
            bucket(s.energy_level, 10).hash(&mut hasher);
            bucket(s.density_level, 10).hash(&mut hasher);
            hasher.finish()
        })
        .collect()
}

pub fn compute_signature(
    tracks: &[Track],
    sections: &[Section],
    beats_per_bar: f64,
    tempo: u32,
    genre: Genre,
) -> CompositionSignature {
    let total_bars = sections.last().map(|s| s.end_bar).unwrap_or(0);
    let melody = melody_hashes(tracks, beats_per_bar, total_bars);
    let harmony = harmony_hashes(tracks, beats_per_bar, total_bars);
    let rhythm = rhythm_hashes(tracks, beats_per_bar, total_bars);
    let structure = structure_hashes(sections);

    let mut hasher = DefaultHasher::new();
    melody.hash(&mut hasher);
    harmony.hash(&mut hasher);
    rhythm.hash(&mut hasher);
    structure.hash(&mut hasher);
    tempo.hash(&mut hasher);
    let overall = hasher.finish();

    CompositionSignature { melody, harmony, rhythm, structure, overall, tempo, genre }
}

/// Longest-common-subsequence length over hash sequences.
fn lcs_len(a: &[u64], b: &[u64]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn sequence_similarity(a: &[u64], b: &[u64]) -> f32 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    lcs_len(a, b) as f32 / longest as f32
}

/// Weighted similarity across melody/harmony/rhythm plus a tempo/genre
/// match term (§4.10): `0.4·melody + 0.3·harmony + 0.2·rhythm +
/// 0.1·(tempo_match + genre_match)/2`.
pub fn similarity(a: &CompositionSignature, b: &CompositionSignature) -> f32 {
    let tempo_match = if a.tempo == b.tempo { 1.0 } else { 0.0 };
    let genre_match = if a.genre == b.genre { 1.0 } else { 0.0 };
    0.4 * sequence_similarity(&a.melody, &b.melody)
        + 0.3 * sequence_similarity(&a.harmony, &b.harmony)
        + 0.2 * sequence_similarity(&a.rhythm, &b.rhythm)
        + 0.1 * (tempo_match + genre_match) / 2.0
}

pub struct SessionHistory {
    entries: VecDeque<CompositionSignature>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        SessionHistory { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn from_signatures(signatures: Vec<CompositionSignature>, capacity: usize) -> Self {
        let mut entries: VecDeque<CompositionSignature> = signatures.into();
        while entries.len() > capacity {
            entries.pop_front();
        }
        SessionHistory { entries, capacity }
    }

    pub fn into_vec(self) -> Vec<CompositionSignature> {
        self.entries.into_iter().collect()
    }

    /// Highest similarity against anything currently in history, 0.0 if
    /// history is empty.
    pub fn max_similarity(&self, candidate: &CompositionSignature) -> f32 {
        self.entries
            .iter()
            .map(|existing| similarity(existing, candidate))
            .fold(0.0f32, f32::max)
    }

    pub fn accepts(&self, candidate: &CompositionSignature, threshold: f32) -> bool {
        self.max_similarity(candidate) < threshold
    }

    pub fn record(&mut self, signature: CompositionSignature) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Note;
    use crate::sections::{plan_sections, SectionName};

    fn lead_track(pitches: &[u8]) -> Track {
        Track {
            name: "lead".into(),
            track_type: TrackType::Lead,
            channel: 0,
            program: 0,
            notes: pitches
                .iter()
                .enumerate()
                .map(|(i, &p)| Note { pitch: p, start_time: i as f64, duration: 1.0, velocity: 80 })
                .collect(),
        }
    }

    #[test]
    fn identical_signatures_are_maximally_similar() {
        let sections = plan_sections(8, crate::intent::Energy::Medium);
        let track = lead_track(&[60, 62, 64, 65]);
        let sig = compute_signature(&[track], &sections, 4.0, 120, Genre::Pop);
        assert!((similarity(&sig, &sig) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn history_rejects_near_duplicate() {
        let sections = plan_sections(8, crate::intent::Energy::Medium);
        let track = lead_track(&[60, 62, 64, 65, 67, 69]);
        let sig = compute_signature(&[track], &sections, 4.0, 120, Genre::Pop);

        let mut history = SessionHistory::new(100);
        history.record(sig.clone());
        assert!(!history.accepts(&sig, 0.70));
    }

    #[test]
    fn history_respects_capacity() {
        let sections = plan_sections(8, crate::intent::Energy::Medium);
        let mut history = SessionHistory::new(2);
        for i in 0..5u8 {
            let track = lead_track(&[60 + i, 61 + i]);
            let sig = compute_signature(&[track], &sections, 4.0, 120, Genre::Pop);
            history.record(sig);
        }
        assert_eq!(history.into_vec().len(), 2);
    }

    #[test]
    fn section_name_variant_used_for_structure_hash() {
        let sections = plan_sections(8, crate::intent::Energy::Medium);
        assert!(sections.iter().any(|s| s.name == SectionName::Intro));
    }
}
