//! Music Theory Kernel (§4.2): pure, deterministic, side-effect-free
//! functions over pitch-class arithmetic. Nothing here touches randomness
//! or process state.

use crate::intent::PitchClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    Major,
    NaturalMinor,
    Dorian,
    PentatonicMajor,
    PentatonicMinor,
    Blues,
    Hirajoshi,
    Yo,
    In,
}

impl Scale {
    /// Scale degrees as semitone offsets from the root, ascending.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::PentatonicMajor => &[0, 2, 4, 7, 9],
            Scale::PentatonicMinor => &[0, 3, 5, 7, 10],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
            // Cultural scales (§9 open question): exposed fully, honored by
            // lead/harmony generators whenever `cultural_style` is set.
            Scale::Hirajoshi => &[0, 2, 3, 7, 8],
            Scale::Yo => &[0, 2, 5, 7, 9],
            Scale::In => &[0, 1, 5, 7, 8],
        }
    }

    pub fn from_name(name: &str) -> Option<Scale> {
        Some(match name.to_ascii_lowercase().as_str() {
            "major" | "ionian" => Scale::Major,
            "natural_minor" | "minor" | "aeolian" => Scale::NaturalMinor,
            "dorian" => Scale::Dorian,
            "pentatonic_major" | "major_pentatonic" => Scale::PentatonicMajor,
            "pentatonic_minor" | "minor_pentatonic" => Scale::PentatonicMinor,
            "blues" => Scale::Blues,
            "hirajoshi" => Scale::Hirajoshi,
            "yo" => Scale::Yo,
            "in" => Scale::In,
            _ => return None,
        })
    }

    /// Default scale for a mode when the intent gives no explicit scale
    /// name (§3, §4.4).
    pub fn for_mode(mode: crate::intent::Mode) -> Scale {
        match mode {
            crate::intent::Mode::Major => Scale::Major,
            crate::intent::Mode::Minor => Scale::NaturalMinor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
}

/// Ascending MIDI pitches for `root`/`scale` across the requested octave
/// range (inclusive), e.g. `3..=5` spans three octaves.
pub fn scale_notes(root: PitchClass, scale: Scale, octave_range: std::ops::RangeInclusive<i32>) -> Vec<u8> {
    let mut pitches = Vec::new();
    for octave in octave_range {
        for &interval in scale.intervals() {
            let midi = (octave + 1) * 12 + root.semitone() as i32 + interval as i32;
            if (0..=127).contains(&midi) {
                pitches.push(midi as u8);
            }
        }
    }
    pitches.sort_unstable();
    pitches
}

/// Consonance weight for an interval in semitones (mod 12): higher is more
/// consonant. Used to rank `consonant_neighbors`.
fn consonance_weight(semitones: u8) -> u32 {
    match semitones % 12 {
        0 => 100,      // unison / octave
        7 => 90,       // perfect fifth
        5 => 80,       // perfect fourth
        4 | 8 => 70,   // major/minor third, sixth
        3 | 9 => 65,
        2 | 10 => 30,  // major second / minor seventh
        _ => 10,       // minor second, tritone, major seventh
    }
}

/// Scale pitches within a perfect fifth of `pitch`, ordered by consonance
/// (most consonant first), per §4.2.
pub fn consonant_neighbors(pitch: u8, scale: &[u8]) -> Vec<u8> {
    let mut neighbors: Vec<u8> = scale
        .iter()
        .copied()
        .filter(|&p| {
            let diff = (p as i16 - pitch as i16).unsigned_abs();
            diff <= 7
        })
        .collect();
    neighbors.sort_by(|a, b| {
        let da = (*a as i16 - pitch as i16).unsigned_abs() as u8;
        let db = (*b as i16 - pitch as i16).unsigned_abs() as u8;
        consonance_weight(db)
            .cmp(&consonance_weight(da))
            .then(da.cmp(&db))
    });
    neighbors
}

/// Tension in `[0,1]`: 0 = unison/octave, 1 = minor second/tritone.
pub fn interval_tension(p1: u8, p2: u8) -> f32 {
    let semis = (p1 as i16 - p2 as i16).unsigned_abs() as u8 % 12;
    match semis {
        0 => 0.0,
        7 => 0.1,
        5 => 0.2,
        4 | 8 => 0.3,
        3 | 9 => 0.35,
        2 | 10 => 0.65,
        1 | 11 | 6 => 1.0,
        _ => 0.5,
    }
}

/// Pitches for a chord built on `degree` (0-indexed) of `scale` rooted at
/// `root`, in `quality`, default close voicing, 3-4 pitches.
pub fn chord_from_degree(root: PitchClass, scale: Scale, degree: usize, quality: ChordQuality) -> Vec<u8> {
    let intervals = scale.intervals();
    let degree_root_semitone = intervals[degree % intervals.len()] as i32
        + (degree / intervals.len()) as i32 * 12;
    let base = 60 + root.semitone() as i32 + degree_root_semitone; // octave 4 anchor

    let chord_intervals: &[i32] = match quality {
        ChordQuality::Major => &[0, 4, 7],
        ChordQuality::Minor => &[0, 3, 7],
        ChordQuality::Diminished => &[0, 3, 6],
        ChordQuality::Augmented => &[0, 4, 8],
        ChordQuality::Dominant7 => &[0, 4, 7, 10],
        ChordQuality::Major7 => &[0, 4, 7, 11],
        ChordQuality::Minor7 => &[0, 3, 7, 10],
    };

    chord_intervals
        .iter()
        .map(|&i| (base + i).clamp(0, 127) as u8)
        .collect()
}

/// Diatonic triad/seventh quality for `degree` of a major or natural-minor
/// scale, the common-practice default used when a genre template names a
/// bare scale degree without an explicit quality (§4.4 chord-progression
/// templates).
pub fn diatonic_quality(scale: Scale, degree: usize) -> ChordQuality {
    let degree = degree % 7;
    match scale {
        Scale::Major => match degree {
            0 | 3 | 4 => ChordQuality::Major,
            1 | 2 | 5 => ChordQuality::Minor,
            _ => ChordQuality::Diminished,
        },
        Scale::NaturalMinor | Scale::Dorian => match degree {
            0 | 3 | 4 => ChordQuality::Minor,
            2 | 5 | 6 => ChordQuality::Major,
            _ => ChordQuality::Diminished,
        },
        _ => ChordQuality::Major,
    }
}

/// Re-voices `next_chord` to minimize total semitone motion from
/// `prev_chord`, by octave-shifting each pitch-class of `next_chord`
/// toward its closest counterpart while staying within `scale`'s pitch
/// classes. Preserves `next_chord`'s length.
pub fn voice_lead(prev_chord: &[u8], next_chord: &[u8]) -> Vec<u8> {
    if prev_chord.is_empty() {
        return next_chord.to_vec();
    }
    next_chord
        .iter()
        .map(|&target| {
            let target_pc = target % 12;
            // Find the octave-shifted instance of this pitch class closest
            // to *some* note in prev_chord, minimizing semitone motion.
            let mut best = target;
            let mut best_motion = u16::MAX;
            for &anchor in prev_chord {
                for octave_shift in -1..=1i16 {
                    let candidate = anchor as i16 - (anchor as i16 % 12) + target_pc as i16 + octave_shift * 12;
                    if !(0..=127).contains(&candidate) {
                        continue;
                    }
                    let motion = (candidate - anchor as i16).unsigned_abs();
                    if motion < best_motion {
                        best_motion = motion;
                        best = candidate as u8;
                    }
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::PitchClass;

    #[test]
    fn scale_notes_ascending_and_in_range() {
        let notes = scale_notes(PitchClass::C, Scale::Major, 3..=5);
        assert!(notes.windows(2).all(|w| w[0] <= w[1]));
        assert!(notes.iter().all(|&p| p <= 127));
    }

    #[test]
    fn consonant_neighbors_orders_fifth_before_second() {
        let scale = scale_notes(PitchClass::C, Scale::Major, 4..=4);
        let neighbors = consonant_neighbors(60, &scale);
        let fifth_pos = neighbors.iter().position(|&p| p == 67);
        let second_pos = neighbors.iter().position(|&p| p == 62);
        assert!(fifth_pos.unwrap() < second_pos.unwrap());
    }

    #[test]
    fn interval_tension_bounds() {
        assert_eq!(interval_tension(60, 60), 0.0);
        assert_eq!(interval_tension(60, 72), 0.0);
        assert_eq!(interval_tension(60, 61), 1.0);
        assert_eq!(interval_tension(60, 66), 1.0);
    }

    #[test]
    fn chord_from_degree_major_triad() {
        let chord = chord_from_degree(PitchClass::C, Scale::Major, 0, ChordQuality::Major);
        assert_eq!(chord.len(), 3);
    }

    #[test]
    fn voice_lead_preserves_length() {
        let prev = chord_from_degree(PitchClass::C, Scale::Major, 0, ChordQuality::Major);
        let next = chord_from_degree(PitchClass::C, Scale::Major, 4, ChordQuality::Major);
        let voiced = voice_lead(&prev, &next);
        assert_eq!(voiced.len(), next.len());
    }
}
