//! Explicit random streams for the data generators.
//!
//! A [`RandomStream`] owns its generator; nothing in the crate touches a global
//! RNG. Monte Carlo iteration `i` of a run seeded with `s` draws from
//! `RandomStream::for_iteration(s, i)`, whose seed is a SplitMix64 hash of
//! `(s, i)`. Neighbouring run seeds therefore do not share iteration streams
//! (plain `s + i` would make run `s` iteration 1 equal run `s + 1` iteration 0).

use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// SplitMix64 increment (golden-ratio gamma).
const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

/// SplitMix64 output function.
#[inline(always)]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Seed of iteration `iteration` within a run seeded by `run_seed`.
#[inline]
pub fn derive_seed(run_seed: u64, iteration: u64) -> u64 {
    mix64(
        mix64(run_seed.wrapping_add(GOLDEN_GAMMA))
            .wrapping_add(iteration.wrapping_mul(GOLDEN_GAMMA)),
    )
}

/// Seedable source of the draws a generator needs.
#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: SmallRng,
}

impl RandomStream {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Independent stream for one Monte Carlo iteration.
    pub fn for_iteration(run_seed: u64, iteration: usize) -> Self {
        Self::from_seed(derive_seed(run_seed, iteration as u64))
    }

    /// Uniform draw on [0, 1).
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// `Normal(mean, sd²)`. `sd` is validated by the scenario, not here.
    #[inline]
    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + sd * z
    }

    /// `Bernoulli(p)`. Values of `p` outside [0, 1] saturate.
    #[inline]
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Index drawn from a prebuilt weighted distribution.
    #[inline]
    pub fn weighted(&mut self, dist: &WeightedIndex<f64>) -> usize {
        self.rng.sample(dist)
    }
}
