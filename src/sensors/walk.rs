// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Bounded random walk - the scalar process behind every simulated quantity

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Default multiplier for the Gaussian noise term
pub const DEFAULT_JITTER: f64 = 0.5;

/// Clamp `v` into `[lo, hi]`
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Round to a fixed number of decimal places
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

/// Construction parameters for a [`BoundedRandomWalk`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkSpec {
    /// Initial value is drawn uniformly from `start.0..=start.1`
    pub start: (f64, f64),
    /// Maximum uniform drift per tick
    pub step: f64,
    pub lo: f64,
    pub hi: f64,
}

impl WalkSpec {
    pub const fn new(start: (f64, f64), step: f64, lo: f64, hi: f64) -> Self {
        Self { start, step, lo, hi }
    }

    /// Spec that starts at exactly `value`
    pub const fn fixed(value: f64, step: f64, lo: f64, hi: f64) -> Self {
        Self::new((value, value), step, lo, hi)
    }

    /// Seed a walk from this spec.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> BoundedRandomWalk {
        let (a, b) = if self.start.0 <= self.start.1 {
            self.start
        } else {
            (self.start.1, self.start.0)
        };
        let start = if a == b { a } else { rng.gen_range(a..=b) };
        BoundedRandomWalk::new(start, self.step, self.lo, self.hi)
    }
}

/// A scalar process clamped to `[lo, hi]`, advanced once per tick.
///
/// Each advance adds a uniform drift in `[-step, step]` and a Gaussian term
/// scaled to 1% of the range, so quantities with wide ranges (pressure in Pa)
/// move visibly alongside narrow ones (humidity in %).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedRandomWalk {
    value: f64,
    step: f64,
    lo: f64,
    hi: f64,
}

impl BoundedRandomWalk {
    pub fn new(start: f64, step: f64, lo: f64, hi: f64) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self {
            value: clamp(start, lo, hi),
            step: step.abs(),
            lo,
            hi,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Shift the persistent state by `delta`, reclamped to the bounds.
    pub fn nudge(&mut self, delta: f64) {
        self.value = clamp(self.value + delta, self.lo, self.hi);
    }

    /// Advance one tick and return the new value.
    ///
    /// A negative or non-finite `jitter_scale` disables the Gaussian term.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, jitter_scale: f64) -> f64 {
        if self.step > 0.0 {
            self.value += rng.gen_range(-self.step..=self.step);
        }

        let sigma = if jitter_scale.is_finite() { jitter_scale.max(0.0) } else { 0.0 };
        if sigma > 0.0 {
            if let Ok(normal) = Normal::new(0.0, sigma) {
                let z: f64 = normal.sample(rng);
                self.value += z * 0.01 * (self.hi - self.lo);
            }
        }

        self.value = clamp(self.value, self.lo, self.hi);
        self.value
    }
}
