//! World defaults and numeric thresholds.
//!
//! The values reproduce the reference analysis:
//! - DID: baseline `pre ~ N(100, 20²)`, covariate `population ~ N(1000, 100²)`,
//!   assignment `pre >= 110`, potential outcomes `N(30 + k·pre [- 40], 20²)`.
//! - IV: `Z ~ Bernoulli(0.5)`, compliance mixture 0.3 / 0.1 / 0.6, residual SD 0.5.
//!
//! Every constant here is only a default: the scenario structs in
//! [`crate::scenario`] carry their own copy so a world can override any of them.

// ── Run defaults ────────────────────────────────────────────────────

/// Units per generated dataset.
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Run-level seed used when none is supplied.
pub const DEFAULT_SEED: u64 = 42;

/// Monte Carlo repetitions per (world, method) cell.
pub const DEFAULT_REPS: usize = 1000;

/// Repetitions folded together before partial accumulators are merged.
pub const REDUCE_CHUNK: usize = 64;

// ── DID world ───────────────────────────────────────────────────────

pub const DID_PRE_MEAN: f64 = 100.0;
pub const DID_PRE_SD: f64 = 20.0;
pub const DID_POPULATION_MEAN: f64 = 1000.0;
pub const DID_POPULATION_SD: f64 = 100.0;

/// Units with `pre_outcome >= DID_THRESHOLD` are assigned.
pub const DID_THRESHOLD: f64 = 110.0;

pub const DID_INTERCEPT: f64 = 30.0;

/// ATT built into Y(1) relative to Y(0).
pub const DID_EFFECT: f64 = -40.0;

pub const DID_OUTCOME_SD: f64 = 20.0;

/// Slope of the potential outcomes on `pre_outcome` when parallel trends hold.
pub const DID_PARALLEL_SLOPE: f64 = 1.0;

/// Slope that makes untreated trends diverge with the baseline.
pub const DID_DIVERGING_SLOPE: f64 = 2.0;

// ── IV world ────────────────────────────────────────────────────────

pub const IV_INSTRUMENT_PROB: f64 = 0.5;

pub const IV_COMPLIER_SHARE: f64 = 0.3;
pub const IV_ALWAYS_TAKER_SHARE: f64 = 0.1;
pub const IV_NEVER_TAKER_SHARE: f64 = 0.6;

/// (Y(0), Y(1)) means per compliance type.
pub const IV_COMPLIER_MEANS: (f64, f64) = (-1.0, -2.5);
pub const IV_ALWAYS_TAKER_MEANS: (f64, f64) = (-2.2, -2.2);
pub const IV_NEVER_TAKER_MEANS: (f64, f64) = (0.0, 0.0);

pub const IV_RESIDUAL_SD: f64 = 0.5;

/// Direct effect of Z on Y in the exclusion-violating world.
pub const IV_LEAKAGE: f64 = -0.5;

/// P(D=1) when treatment is drawn independently of the instrument.
pub const IV_RANDOM_TREATMENT_PROB: f64 = 0.5;

// ── Numerics ────────────────────────────────────────────────────────

/// Compliance shares may miss 1.0 by at most this much.
pub const PROPORTION_TOLERANCE: f64 = 1e-9;

/// Relative singular-value cutoff below which a design is rank-deficient.
pub const SINGULAR_TOLERANCE: f64 = 1e-10;

/// First-stage F below this marks the instrument as weak (Staiger–Stock).
pub const WEAK_INSTRUMENT_F: f64 = 10.0;

/// Nominal level for the confidence intervals used in coverage.
pub const COVERAGE_LEVEL: f64 = 0.95;
