//! Variation Engine (§4.1): the sole source of controlled randomness in the
//! composition core. No other module may touch a global/process-wide PRNG —
//! this is the single most important invariant carried over from §9's
//! re-architecture notes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct VariationEngine {
    rng: ChaCha8Rng,
}

impl VariationEngine {
    /// Seeds from `(nanosecond wall clock, session_id, generation_counter)`
    /// so consecutive calls within the same millisecond still diverge.
    pub fn initialize(session_id: &str, generation_counter: u64) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        nanos.hash(&mut hasher);
        session_id.hash(&mut hasher);
        generation_counter.hash(&mut hasher);
        let seed = hasher.finish();

        log::debug!("variation engine seeded: session={session_id} gen={generation_counter} seed={seed:#x}");

        VariationEngine {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Builds a deterministic engine for tests — never used by the
    /// pipeline itself, which always calls `initialize`.
    #[cfg(test)]
    pub fn from_seed(seed: u64) -> Self {
        VariationEngine {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    pub fn uniform_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    pub fn choose<'a, T>(&mut self, sequence: &'a [T]) -> &'a T {
        let idx = self.rng.gen_range(0..sequence.len());
        &sequence[idx]
    }

    pub fn weighted_choice<'a, T>(&mut self, items: &'a [(T, u32)]) -> &'a T {
        let total: u32 = items.iter().map(|(_, w)| *w).sum();
        let mut x = self.rng.gen_range(0..total.max(1));
        for (value, weight) in items {
            if x < *weight {
                return value;
            }
            x = x.saturating_sub(*weight);
        }
        &items.last().expect("weighted_choice called with empty items").0
    }

    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Box-Muller transform; rand's distribution helpers aren't part of the
    /// dependency stack so this composes directly on top of `Rng`.
    pub fn gaussian(&mut self, mu: f64, sigma: f64) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        let z0 = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mu + z0 * sigma
    }

    pub fn jitter_timing(&mut self, beats: f64, sigma: f64) -> f64 {
        (beats + self.gaussian(0.0, sigma)).max(0.0)
    }

    pub fn jitter_velocity(&mut self, velocity: u8, sigma: f64) -> u8 {
        let jittered = velocity as f64 + self.gaussian(0.0, sigma);
        jittered.clamp(30.0, 120.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_timing_never_negative() {
        let mut engine = VariationEngine::from_seed(1);
        for _ in 0..1000 {
            assert!(engine.jitter_timing(0.0, 5.0) >= 0.0);
        }
    }

    #[test]
    fn jitter_velocity_stays_in_range() {
        let mut engine = VariationEngine::from_seed(2);
        for _ in 0..1000 {
            let v = engine.jitter_velocity(60, 20.0);
            assert!((30..=120).contains(&v));
        }
    }

    #[test]
    fn weighted_choice_respects_zero_weight() {
        let mut engine = VariationEngine::from_seed(3);
        let items = [("never", 0u32), ("always", 10u32)];
        for _ in 0..200 {
            assert_eq!(*engine.weighted_choice(&items), "always");
        }
    }

    #[test]
    fn distinct_seeds_for_consecutive_initialize_calls() {
        let mut a = VariationEngine::initialize("session", 0);
        let mut b = VariationEngine::initialize("session", 1);
        let seq_a: Vec<i64> = (0..8).map(|_| a.uniform_int(0, 1_000_000)).collect();
        let seq_b: Vec<i64> = (0..8).map(|_| b.uniform_int(0, 1_000_000)).collect();
        assert_ne!(seq_a, seq_b);
    }
}
