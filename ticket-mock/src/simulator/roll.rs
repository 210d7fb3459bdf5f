use std::fmt;

use parking_lot::Mutex;
use rand::{
    SeedableRng as _,
    distr::{Distribution as _, StandardUniform},
    rngs::StdRng,
};

/// Source of the uniform `[0, 1)` draw which decides
/// whether a creation request fails randomly.
pub trait FailureRoll: fmt::Debug + Send + Sync + 'static {
    fn roll(&self) -> f64;
}

/// Draws from the thread-local rng.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRoll;

impl FailureRoll for ThreadRoll {
    #[inline(always)]
    fn roll(&self) -> f64 {
        rand::random()
    }
}

/// Reproducible draws from a seeded rng.
pub struct SeededRoll {
    seed: u64,
    rng: Mutex<StdRng>,
}

impl SeededRoll {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl fmt::Debug for SeededRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRoll")
            .field("seed", &self.seed)
            .finish()
    }
}

impl FailureRoll for SeededRoll {
    fn roll(&self) -> f64 {
        StandardUniform.sample(&mut *self.rng.lock())
    }
}

/// Always returns the same value, clamped into `[0, 1)`.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(f64);

#[cfg(test)]
impl FixedRoll {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0., 1. - f64::EPSILON))
    }
}

#[cfg(test)]
impl FailureRoll for FixedRoll {
    #[inline(always)]
    fn roll(&self) -> f64 {
        self.0
    }
}
