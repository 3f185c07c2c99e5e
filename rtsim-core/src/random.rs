//! Random number generation provider abstraction.
//!
//! Every worker owns its own generator, seeded from the value the orchestrator
//! hands it at launch. There is no process-wide RNG state: two workers with the
//! same parameters but different seeds produce independent sample streams.

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::distr::{Distribution, StandardUniform};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::SampleError;
use crate::task::Bounds;

/// Provider trait for random number generation.
pub trait RandomProvider {
    /// Generate a random value of type T.
    fn random<T>(&mut self) -> T
    where
        StandardUniform: Distribution<T>;

    /// Generate a random value within a range.
    ///
    /// Accepts both exclusive (`a..b`) and inclusive (`a..=b`) ranges.
    fn random_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>;
}

/// Deterministic random provider backed by ChaCha8.
///
/// The same seed always produces the same sequence of values.
#[derive(Debug, Clone)]
pub struct SeededRandomProvider {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandomProvider {
    /// Create a provider from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a provider seeded from the thread-local OS-backed generator.
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }

    /// The seed this provider was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomProvider for SeededRandomProvider {
    fn random<T>(&mut self) -> T
    where
        StandardUniform: Distribution<T>,
    {
        self.rng.random()
    }

    fn random_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.random_range(range)
    }
}

/// Sample a timing parameter, in seconds, uniformly from `bounds`.
///
/// A degenerate interval (`min == max`) returns `min` exactly without drawing
/// from the generator. Otherwise the value is drawn from the closed interval
/// `[min, max]`.
pub fn uniform<R: RandomProvider>(rng: &mut R, bounds: Bounds) -> Result<f64, SampleError> {
    let Bounds { min, max } = bounds;
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        return Err(SampleError::InvalidInterval { min, max });
    }
    if min == max {
        return Ok(min);
    }
    Ok(rng.random_range(min..=max))
}
