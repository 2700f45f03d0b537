//! Streaming reduction of per-repetition estimates into a [`BiasResult`].
//!
//! [`EstimateStats`] is a Welford accumulator with Chan's pairwise merge, so
//! chunks can be summarized independently and combined. Floating-point
//! merging is not associative, so callers fix the chunking and merge order
//! (see `engine::summarize_chunk`) to keep results independent of thread count.

use serde::{Deserialize, Serialize};

use crate::estimation::{EstimationResult, Method};

/// Running moments of the estimates plus coverage and reliability counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EstimateStats {
    count: u64,
    mean: f64,
    m2: f64,
    se_sum: f64,
    se_count: u64,
    covered: u64,
    flagged: u64,
}

impl EstimateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one repetition. Non-finite estimates are counted as flagged but
    /// kept out of the moments.
    pub fn push(&mut self, result: &EstimationResult, true_effect: f64, level: f64) {
        if !result.is_reliable() {
            self.flagged += 1;
        }
        if !result.estimate.is_finite() {
            return;
        }

        self.count += 1;
        let delta = result.estimate - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (result.estimate - self.mean);

        if result.std_error.is_finite() {
            self.se_sum += result.std_error;
            self.se_count += 1;
        }
        if result.covers(true_effect, level) {
            self.covered += 1;
        }
    }

    pub fn merge(&mut self, other: &EstimateStats) {
        if other.count == 0 {
            self.flagged += other.flagged;
            return;
        }
        if self.count == 0 {
            let flagged = self.flagged;
            *self = other.clone();
            self.flagged += flagged;
            return;
        }
        let a = self.count as f64;
        let b = other.count as f64;
        let n = a + b;
        let delta = other.mean - self.mean;
        self.mean += delta * b / n;
        self.m2 += other.m2 + delta * delta * a * b / n;
        self.count += other.count;
        self.se_sum += other.se_sum;
        self.se_count += other.se_count;
        self.covered += other.covered;
        self.flagged += other.flagged;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Sample variance (n − 1 denominator).
    pub fn variance_sample(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Population variance (n denominator), the spread term of the RMSE.
    pub fn variance_population(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn mean_std_error(&self) -> f64 {
        if self.se_count == 0 {
            f64::INFINITY
        } else {
            self.se_sum / self.se_count as f64
        }
    }

    pub fn coverage(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.covered as f64 / self.count as f64
        }
    }

    pub fn flagged(&self) -> u64 {
        self.flagged
    }
}

/// Monte Carlo summary of one (world, method) cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiasResult {
    pub world: String,
    pub method: Method,
    pub true_effect: f64,
    pub reps: usize,
    pub mean_estimate: f64,
    /// `mean_estimate − true_effect`.
    pub bias: f64,
    /// Empirical SD of the estimates across repetitions.
    pub sd_estimate: f64,
    /// Standard error of `mean_estimate`, `sd_estimate / √reps`.
    pub mc_std_error: f64,
    pub rmse: f64,
    /// Mean of the finite per-repetition standard errors.
    pub mean_std_error: f64,
    /// Share of repetitions whose interval covers `true_effect`.
    pub coverage: f64,
    /// Repetitions that are degenerate (any method) or carry a non-strong
    /// instrument; see [`EstimationResult::is_reliable`].
    pub unreliable_reps: u64,
}

impl BiasResult {
    pub fn from_stats(
        world: &str,
        method: Method,
        true_effect: f64,
        reps: usize,
        stats: &EstimateStats,
    ) -> Self {
        let mean_estimate = stats.mean();
        let bias = mean_estimate - true_effect;
        let sd_estimate = stats.variance_sample().sqrt();
        let mc_std_error = if stats.count() == 0 {
            f64::NAN
        } else {
            sd_estimate / (stats.count() as f64).sqrt()
        };
        Self {
            world: world.to_string(),
            method,
            true_effect,
            reps,
            mean_estimate,
            bias,
            sd_estimate,
            mc_std_error,
            rmse: (bias * bias + stats.variance_population()).sqrt(),
            mean_std_error: stats.mean_std_error(),
            coverage: stats.coverage(),
            unreliable_reps: stats.flagged(),
        }
    }
}
