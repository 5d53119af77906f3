//! Seeded random source for persona sampling.
//!
//! Every draw goes through an explicit [`SampleRng`]; nothing in the
//! sampler touches a thread-local or OS RNG. All helpers are built on
//! `next_u64` so the stream is stable for a given seed.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use uuid::Uuid;

/// Deterministic RNG for one persona.
pub struct SampleRng {
    inner: Pcg64Mcg,
}

impl SampleRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Raw 64-bit draw.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Integer in [0, n) as `next_u64() % n`, one draw per call. Returns 0
    /// without drawing when `n` is 0.
    ///
    /// The reduction is part of the seed-to-persona contract: a rejection
    /// sampler such as `gen_range` would consume a varying number of draws
    /// and shift every later field. The modulo bias is below `n / 2^64`,
    /// which for the table sizes used here is far under one in 10^15.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.next_u64() % n
    }

    /// Uniform index into a slice of length `len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.below(len as u64) as usize
    }

    /// Bernoulli trial with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick an index proportionally to `weights`.
    ///
    /// Non-positive and non-finite weights never win. Returns `None`
    /// (without drawing) when no weight is positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let usable = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let total: f64 = weights.iter().copied().map(usable).sum();
        if total <= 0.0 {
            return None;
        }

        let target = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for (i, w) in weights.iter().copied().map(usable).enumerate() {
            if w <= 0.0 {
                continue;
            }
            cumulative += w;
            last_positive = Some(i);
            if target < cumulative {
                return Some(i);
            }
        }
        // Rounding can leave `target` a hair above the final sum.
        last_positive
    }

    /// Version-4 UUID built from 16 drawn bytes.
    pub fn uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.next_u64().to_le_bytes());
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}
