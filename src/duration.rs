//! Duration Model (§4.3): parses free-text duration expressions into a
//! canonical `DurationRequest`, and converts between seconds, bars and
//! beats given a tempo and time signature.

use serde::{Deserialize, Serialize};

pub const MIN_SECONDS: f64 = 5.0;
pub const MAX_SECONDS: f64 = 600.0;
pub const DEFAULT_SECONDS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Bars,
    Beats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRequest {
    pub value: f64,
    pub unit: DurationUnit,
}

impl Default for DurationRequest {
    fn default() -> Self {
        DurationRequest {
            value: DEFAULT_SECONDS,
            unit: DurationUnit::Seconds,
        }
    }
}

/// Result of `validate`: either the request passed through unchanged, or it
/// was clamped and a warning message is attached (§4.3, §8).
#[derive(Debug, Clone)]
pub struct ValidatedDuration {
    pub request: DurationRequest,
    pub warning: Option<String>,
}

/// Parse free text for a duration expression. Tries, in order, minutes,
/// MM:SS, seconds, bars, beats — first match wins (§4.3).
pub fn parse(text: &str) -> Option<DurationRequest> {
    if let Some(minutes) = scan_decimal_unit(text, &["minutes", "minute", "mins", "min", "m"]) {
        return Some(DurationRequest {
            value: minutes,
            unit: DurationUnit::Minutes,
        });
    }
    if let Some((mm, ss)) = scan_mmss(text) {
        return Some(DurationRequest {
            value: (mm * 60 + ss) as f64,
            unit: DurationUnit::Seconds,
        });
    }
    if let Some(seconds) = scan_decimal_unit(text, &["seconds", "second", "secs", "sec", "s"]) {
        return Some(DurationRequest {
            value: seconds,
            unit: DurationUnit::Seconds,
        });
    }
    if let Some(bars) = scan_integer_unit(text, &["bars", "bar"]) {
        return Some(DurationRequest {
            value: bars as f64,
            unit: DurationUnit::Bars,
        });
    }
    if let Some(beats) = scan_integer_unit(text, &["beats", "beat"]) {
        return Some(DurationRequest {
            value: beats as f64,
            unit: DurationUnit::Beats,
        });
    }
    None
}

/// Convert a request to seconds given tempo (BPM) and beats-per-bar (time
/// signature numerator; the core assumes 4/4 so this is 4 everywhere it's
/// called from the pipeline, but the conversion itself is general).
pub fn to_seconds(req: DurationRequest, tempo_bpm: u32, beats_per_bar: u32) -> f64 {
    let seconds_per_beat = 60.0 / tempo_bpm.max(1) as f64;
    match req.unit {
        DurationUnit::Seconds => req.value,
        DurationUnit::Minutes => req.value * 60.0,
        DurationUnit::Bars => req.value * beats_per_bar as f64 * seconds_per_beat,
        DurationUnit::Beats => req.value * seconds_per_beat,
    }
}

pub fn to_bars(req: DurationRequest, tempo_bpm: u32, beats_per_bar: u32) -> u32 {
    let seconds = to_seconds(req, tempo_bpm, beats_per_bar);
    let seconds_per_bar = beats_per_bar as f64 * 60.0 / tempo_bpm.max(1) as f64;
    (seconds / seconds_per_bar).round().max(1.0) as u32
}

/// Clamp a request to `[min, max]` seconds, returning a canonical
/// seconds-unit request plus an optional warning (§4.3, §8).
pub fn validate(
    req: DurationRequest,
    tempo_bpm: u32,
    beats_per_bar: u32,
    min: f64,
    max: f64,
) -> ValidatedDuration {
    let seconds = to_seconds(req, tempo_bpm, beats_per_bar);
    if seconds < min {
        return ValidatedDuration {
            request: DurationRequest {
                value: min,
                unit: DurationUnit::Seconds,
            },
            warning: Some(format!(
                "duration {seconds:.1}s below minimum, clamped to {min:.0}s"
            )),
        };
    }
    if seconds > max {
        return ValidatedDuration {
            request: DurationRequest {
                value: max,
                unit: DurationUnit::Seconds,
            },
            warning: Some(format!(
                "duration {seconds:.1}s above maximum, clamped to {max:.0}s"
            )),
        };
    }
    ValidatedDuration {
        request: DurationRequest {
            value: seconds,
            unit: DurationUnit::Seconds,
        },
        warning: None,
    }
}

fn char_at(chars: &[char], idx: usize) -> Option<char> {
    chars.get(idx).copied()
}

fn is_boundary_before(chars: &[char], start: usize) -> bool {
    start == 0 || !char_at(chars, start - 1).unwrap().is_ascii_alphanumeric()
}

fn is_boundary_after(chars: &[char], end: usize) -> bool {
    end >= chars.len() || !char_at(chars, end).unwrap().is_ascii_alphanumeric()
}

fn match_unit_at(chars: &[char], pos: usize, units: &[&str]) -> Option<usize> {
    for unit in units {
        let ulen = unit.chars().count();
        if pos + ulen > chars.len() {
            continue;
        }
        let candidate: String = chars[pos..pos + ulen].iter().collect();
        if candidate.eq_ignore_ascii_case(unit) && is_boundary_after(chars, pos + ulen) {
            return Some(ulen);
        }
    }
    None
}

/// Scans for `\d+(\.\d+)?\s*<unit>\b`, case-insensitive, returning the
/// parsed number of the first match.
fn scan_decimal_unit(text: &str, units: &[&str]) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() && is_boundary_before(&chars, i) {
            let start = i;
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            if j < chars.len() && chars[j] == '.' && char_at(&chars, j + 1).is_some_and(|c| c.is_ascii_digit()) {
                j += 1;
                while j < chars.len() && chars[j].is_ascii_digit() {
                    j += 1;
                }
            }
            let num_str: String = chars[start..j].iter().collect();
            if let Ok(num) = num_str.parse::<f64>() {
                let mut k = j;
                while k < chars.len() && chars[k].is_whitespace() {
                    k += 1;
                }
                if match_unit_at(&chars, k, units).is_some() {
                    return Some(num);
                }
            }
            i = j.max(i + 1);
        } else {
            i += 1;
        }
    }
    None
}

/// Scans for `\d+\s*<unit>\b` (no decimal point, per the bars/beats grammar).
fn scan_integer_unit(text: &str, units: &[&str]) -> Option<u32> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() && is_boundary_before(&chars, i) {
            let start = i;
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            let num_str: String = chars[start..j].iter().collect();
            if let Ok(num) = num_str.parse::<u32>() {
                let mut k = j;
                while k < chars.len() && chars[k].is_whitespace() {
                    k += 1;
                }
                if match_unit_at(&chars, k, units).is_some() {
                    return Some(num);
                }
            }
            i = j.max(i + 1);
        } else {
            i += 1;
        }
    }
    None
}

/// Scans for `\d+:\d{2}` (MM:SS).
fn scan_mmss(text: &str) -> Option<(u32, u32)> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() && is_boundary_before(&chars, i) {
            let start = i;
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            if char_at(&chars, j) == Some(':')
                && char_at(&chars, j + 1).is_some_and(|c| c.is_ascii_digit())
                && char_at(&chars, j + 2).is_some_and(|c| c.is_ascii_digit())
                && !char_at(&chars, j + 3).is_some_and(|c| c.is_ascii_digit())
            {
                let mm: u32 = chars[start..j].iter().collect::<String>().parse().ok()?;
                let ss: u32 = chars[j + 1..j + 3].iter().collect::<String>().parse().ok()?;
                return Some((mm, ss));
            }
            i = j.max(i + 1);
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes() {
        let r = parse("5 minutes").unwrap();
        assert_eq!(r.unit, DurationUnit::Minutes);
        assert_eq!(r.value, 5.0);
    }

    #[test]
    fn parses_abbreviated_minutes() {
        assert_eq!(parse("5m").unwrap().value, 5.0);
        assert_eq!(parse("5 min").unwrap().unit, DurationUnit::Minutes);
    }

    #[test]
    fn does_not_match_inside_word() {
        assert!(parse("warmth").is_none());
    }

    #[test]
    fn mmss_wins_over_seconds() {
        let r = parse("2:30").unwrap();
        assert_eq!(r.unit, DurationUnit::Seconds);
        assert_eq!(r.value, 150.0);
    }

    #[test]
    fn parses_bars_and_beats() {
        assert_eq!(parse("32 bars").unwrap().unit, DurationUnit::Bars);
        assert_eq!(parse("64 beats").unwrap().unit, DurationUnit::Beats);
    }

    #[test]
    fn validate_clamps_short_and_long() {
        let short = validate(
            DurationRequest {
                value: 2.0,
                unit: DurationUnit::Seconds,
            },
            120,
            4,
            MIN_SECONDS,
            MAX_SECONDS,
        );
        assert!(short.warning.is_some());
        assert_eq!(short.request.value, MIN_SECONDS);

        let long = validate(
            DurationRequest {
                value: 15.0,
                unit: DurationUnit::Minutes,
            },
            120,
            4,
            MIN_SECONDS,
            MAX_SECONDS,
        );
        assert!(long.warning.is_some());
        assert_eq!(long.request.value, MAX_SECONDS);
    }

    #[test]
    fn to_seconds_idempotent_for_canonical_strings() {
        let req = parse("90 seconds").unwrap();
        let secs = to_seconds(req, 120, 4);
        assert_eq!(secs, 90.0);
        let reparsed = parse(&format!("{secs} seconds")).unwrap();
        assert_eq!(to_seconds(reparsed, 120, 4), secs);
    }
}
