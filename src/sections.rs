//! Section Structure Planner (§4.5): maps a total-bar budget to a sequence
//! of sections with energy/density envelopes.

use serde::{Deserialize, Serialize};

use crate::intent::Energy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionName {
    Intro,
    Verse,
    Chorus,
    Bridge,
    Outro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Characteristic {
    Build,
    Peak,
    Contrast,
    Fade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: SectionName,
    pub start_bar: u32,
    pub end_bar: u32,
    pub energy_level: f32,
    pub density_level: f32,
    pub characteristics: Vec<Characteristic>,
}

impl Section {
    pub fn bars(&self) -> u32 {
        self.end_bar - self.start_bar
    }
}

pub(crate) fn base_targets(name: SectionName) -> (f32, f32) {
    match name {
        SectionName::Intro => (0.4, 0.5),
        SectionName::Verse => (0.6, 0.7),
        SectionName::Chorus => (0.9, 0.9),
        SectionName::Bridge => (0.7, 0.6),
        SectionName::Outro => (0.5, 0.5),
    }
}

/// Names-in-order and their nominal bar share for each of the four form
/// templates named in §4.5. The planner scales these shares to the actual
/// `total_bars` and absorbs the rounding remainder into the longest
/// section, so the sum is always exact.
fn template_for(total_bars: u32) -> Vec<(SectionName, u32)> {
    match total_bars {
        0..=16 => vec![
            (SectionName::Intro, 1),
            (SectionName::Verse, 2), // "body"
            (SectionName::Outro, 1),
        ],
        17..=32 => vec![
            (SectionName::Intro, 8),
            (SectionName::Verse, 8),
            (SectionName::Chorus, 8),
            (SectionName::Bridge, 4),
            (SectionName::Outro, 4),
        ],
        33..=64 => vec![
            (SectionName::Intro, 1),
            (SectionName::Verse, 2),
            (SectionName::Chorus, 2),
            (SectionName::Verse, 2),
            (SectionName::Chorus, 2),
            (SectionName::Bridge, 1),
            (SectionName::Outro, 1),
        ],
        _ => vec![
            (SectionName::Intro, 1),
            (SectionName::Verse, 2),
            (SectionName::Chorus, 2),
            (SectionName::Verse, 2),
            (SectionName::Chorus, 2),
            (SectionName::Chorus, 2),
            (SectionName::Bridge, 1),
            (SectionName::Outro, 1),
        ],
    }
}

/// Produces the `Section` list for `total_bars`, modulated by `energy`
/// (§4.5). The sum of section bars always equals `total_bars` exactly.
pub fn plan_sections(total_bars: u32, energy: Energy) -> Vec<Section> {
    let total_bars = total_bars.max(1);
    let mut template = template_for(total_bars);
    // A short enough request can have fewer bars than the template has
    // sections (e.g. the 5s minimum duration at a slow tempo yields a
    // single bar); drop the tail rather than let a 1-bar section share
    // dip below 1 and break the exact-partition invariant.
    if template.len() as u32 > total_bars {
        template.truncate(total_bars as usize);
    }
    let share_sum: u32 = template.iter().map(|(_, share)| share).sum();

    let mut bars: Vec<u32> = template
        .iter()
        .map(|(_, share)| ((*share as f64 / share_sum as f64) * total_bars as f64).floor() as u32)
        .collect();
    bars.iter_mut().for_each(|b| *b = (*b).max(1));

    // Absorb the rounding remainder into the longest section so the
    // partition is exact (§4.5 invariant).
    let assigned: u32 = bars.iter().sum();
    if assigned != total_bars {
        let longest_idx = bars
            .iter()
            .enumerate()
            .max_by_key(|(_, b)| **b)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let diff = total_bars as i64 - assigned as i64;
        bars[longest_idx] = (bars[longest_idx] as i64 + diff).max(1) as u32;
    }

    let energy_bias = energy.bias();
    let mut start = 0u32;
    let mut sections = Vec::with_capacity(template.len());
    for (idx, (name, _)) in template.iter().enumerate() {
        let end = start + bars[idx];
        let (base_energy, base_density) = base_targets(*name);
        let energy_level = (base_energy + energy_bias).clamp(0.0, 1.0);
        let density_level = (base_density + energy_bias).clamp(0.0, 1.0);

        let mut characteristics = Vec::new();
        if *name == SectionName::Bridge {
            characteristics.push(Characteristic::Contrast);
        }
        let next_is_peak = template
            .get(idx + 1)
            .is_some_and(|(n, _)| *n == SectionName::Chorus);
        if next_is_peak {
            characteristics.push(Characteristic::Build);
        }
        if *name == SectionName::Chorus {
            characteristics.push(Characteristic::Peak);
        }
        if *name == SectionName::Outro {
            characteristics.push(Characteristic::Fade);
        }

        sections.push(Section {
            name: *name,
            start_bar: start,
            end_bar: end,
            energy_level,
            density_level,
            characteristics,
        });
        start = end;
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_partition_exactly() {
        for total in [8, 16, 24, 32, 48, 64, 96, 128] {
            let sections = plan_sections(total, Energy::Medium);
            assert_eq!(sections.first().unwrap().start_bar, 0);
            assert_eq!(sections.last().unwrap().end_bar, total);
            for w in sections.windows(2) {
                assert_eq!(w[0].end_bar, w[1].start_bar);
            }
            let sum: u32 = sections.iter().map(|s| s.bars()).sum();
            assert_eq!(sum, total);
        }
    }

    #[test]
    fn very_short_requests_still_partition_exactly() {
        for total in [1, 2, 3] {
            let sections = plan_sections(total, Energy::Medium);
            let sum: u32 = sections.iter().map(|s| s.bars()).sum();
            assert_eq!(sum, total);
            assert_eq!(sections.last().unwrap().end_bar, total);
        }
    }

    #[test]
    fn energy_modulates_density_within_bounds() {
        for s in plan_sections(32, Energy::High) {
            assert!(s.density_level <= 1.0);
            assert!(s.energy_level <= 1.0);
        }
        for s in plan_sections(32, Energy::Low) {
            assert!(s.density_level >= 0.0);
        }
    }
}
