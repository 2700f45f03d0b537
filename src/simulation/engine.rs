//! Monte Carlo runner: R independent (generate, estimate) cycles.
//!
//! Repetition `i` draws its dataset from `RandomStream::for_iteration(seed, i)`
//! and nothing else, so repetitions can run on any thread in any order. The
//! estimates are collected in repetition order and reduced in fixed chunks of
//! [`REDUCE_CHUNK`] merged left to right. The parallel and sequential paths
//! therefore produce bit-identical [`BiasResult`]s regardless of pool size.

use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use crate::constants::{COVERAGE_LEVEL, DEFAULT_REPS, DEFAULT_SEED, REDUCE_CHUNK};
use crate::error::{ConfigError, ConfigResult};
use crate::estimation::{EffectEstimator, EstimationResult};
use crate::generators::DataGenerator;
use crate::random::RandomStream;

use super::statistics::{BiasResult, EstimateStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonteCarloRunner {
    reps: usize,
    seed: u64,
}

impl Default for MonteCarloRunner {
    fn default() -> Self {
        Self {
            reps: DEFAULT_REPS,
            seed: DEFAULT_SEED,
        }
    }
}

impl MonteCarloRunner {
    pub fn new(reps: usize, seed: u64) -> ConfigResult<Self> {
        if reps == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        Ok(Self { reps, seed })
    }

    pub fn reps(&self) -> usize {
        self.reps
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run one repetition.
    #[inline]
    fn repetition<G, E>(&self, generator: &G, estimator: &E, i: usize) -> EstimationResult
    where
        G: DataGenerator,
        E: EffectEstimator<G::Dataset>,
    {
        let mut rng = RandomStream::for_iteration(self.seed, i);
        let data = generator.generate(&mut rng);
        estimator.estimate(&data)
    }

    /// Every repetition's estimate, in repetition order, computed in parallel.
    pub fn estimates<G, E>(&self, generator: &G, estimator: &E) -> Vec<EstimationResult>
    where
        G: DataGenerator,
        E: EffectEstimator<G::Dataset>,
    {
        (0..self.reps)
            .into_par_iter()
            .map(|i| self.repetition(generator, estimator, i))
            .collect()
    }

    /// Parallel Monte Carlo run.
    pub fn run<G, E>(&self, generator: &G, estimator: &E, true_effect: f64) -> BiasResult
    where
        G: DataGenerator,
        E: EffectEstimator<G::Dataset>,
    {
        let start = Instant::now();
        debug!(
            world = generator.world(),
            method = estimator.method().as_str(),
            reps = self.reps,
            seed = self.seed,
            "monte carlo run started"
        );

        let estimates = self.estimates(generator, estimator);
        let partials: Vec<EstimateStats> = estimates
            .par_chunks(REDUCE_CHUNK)
            .map(|chunk| summarize_chunk(chunk, true_effect))
            .collect();
        let result = self.finish(generator, estimator, true_effect, &partials);

        info!(
            world = %result.world,
            method = result.method.as_str(),
            bias = result.bias,
            sd = result.sd_estimate,
            flagged = result.unreliable_reps,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "monte carlo run finished"
        );
        result
    }

    /// Single-threaded reference path; same result as [`run`](Self::run).
    pub fn run_sequential<G, E>(&self, generator: &G, estimator: &E, true_effect: f64) -> BiasResult
    where
        G: DataGenerator,
        E: EffectEstimator<G::Dataset>,
    {
        let estimates: Vec<EstimationResult> = (0..self.reps)
            .map(|i| self.repetition(generator, estimator, i))
            .collect();
        let partials: Vec<EstimateStats> = estimates
            .chunks(REDUCE_CHUNK)
            .map(|chunk| summarize_chunk(chunk, true_effect))
            .collect();
        self.finish(generator, estimator, true_effect, &partials)
    }

    /// Run against the generator's own ground truth.
    pub fn run_default<G, E>(&self, generator: &G, estimator: &E) -> BiasResult
    where
        G: DataGenerator,
        E: EffectEstimator<G::Dataset>,
    {
        self.run(generator, estimator, generator.true_effect())
    }

    fn finish<G, E>(
        &self,
        generator: &G,
        estimator: &E,
        true_effect: f64,
        partials: &[EstimateStats],
    ) -> BiasResult
    where
        G: DataGenerator,
        E: EffectEstimator<G::Dataset>,
    {
        let stats = partials.iter().fold(EstimateStats::new(), |mut acc, p| {
            acc.merge(p);
            acc
        });
        BiasResult::from_stats(
            generator.world(),
            estimator.method(),
            true_effect,
            self.reps,
            &stats,
        )
    }
}

fn summarize_chunk(chunk: &[EstimationResult], true_effect: f64) -> EstimateStats {
    let mut stats = EstimateStats::new();
    for r in chunk {
        stats.push(r, true_effect, COVERAGE_LEVEL);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::{AsTreated, DidRegression, Tsls};
    use crate::generators::{DidGenerator, IvGenerator};
    use crate::scenario::{DidScenario, IvScenario};

    fn small_iv(scenario: IvScenario) -> IvGenerator {
        IvGenerator::new(scenario.with_sample_size(300)).unwrap()
    }

    #[test]
    fn test_zero_reps_rejected() {
        assert_eq!(MonteCarloRunner::new(0, 1), Err(ConfigError::ZeroRepetitions));
        let runner = MonteCarloRunner::default();
        assert_eq!(runner.reps(), DEFAULT_REPS);
        assert_eq!(runner.seed(), DEFAULT_SEED);
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let generator = small_iv(IvScenario::world_a());
        let runner = MonteCarloRunner::new(150, 7).unwrap();
        let par = runner.run(&generator, &Tsls::default(), -1.5);
        let seq = runner.run_sequential(&generator, &Tsls::default(), -1.5);
        assert_eq!(par, seq);
        assert_eq!(par.reps, 150);
    }

    #[test]
    fn test_same_seed_same_result() {
        let generator = DidGenerator::new(DidScenario::parallel_trends().with_sample_size(200)).unwrap();
        let runner = MonteCarloRunner::new(40, 99).unwrap();
        let a = runner.run_default(&generator, &DidRegression::default());
        let b = runner.run_default(&generator, &DidRegression::default());
        assert_eq!(a, b);
        assert_eq!(a.true_effect, -40.0);
    }

    #[test]
    fn test_different_seeds_differ() {
        let generator = small_iv(IvScenario::world_a());
        let a = MonteCarloRunner::new(20, 1).unwrap().run(&generator, &AsTreated::default(), -1.5);
        let b = MonteCarloRunner::new(20, 2).unwrap().run(&generator, &AsTreated::default(), -1.5);
        assert_ne!(a.mean_estimate, b.mean_estimate);
    }

    #[test]
    fn test_estimates_are_in_repetition_order() {
        let generator = small_iv(IvScenario::world_b());
        let runner = MonteCarloRunner::new(10, 5).unwrap();
        let all = runner.estimates(&generator, &Tsls::default());
        assert_eq!(all.len(), 10);
        for (i, r) in all.iter().enumerate() {
            assert_eq!(*r, runner.repetition(&generator, &Tsls::default(), i));
        }
    }
}
