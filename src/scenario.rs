//! World definitions: immutable, validated parameter bundles.
//!
//! A world is a preset of one of two parametrized families. The assumption
//! knobs are plain fields:
//!
//! | World | Family | Knob |
//! |-------|--------|------|
//! | `did-parallel` | [`DidScenario`] | `trend_slope = 1` |
//! | `did-diverging` | [`DidScenario`] | `trend_slope = 2` (breaks parallel trends) |
//! | `iv-a` | [`IvScenario`] | all assumptions hold |
//! | `iv-b` | [`IvScenario`] | `exclusion_leakage = -0.5` |
//! | `iv-c` | [`IvScenario`] | `instrument_relevant = false` |
//!
//! Scenarios deserialize with `#[serde(default)]`, so a JSON file only needs
//! the fields it changes. Call [`Scenario::validate`] (the generators do it
//! for you) before drawing anything.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{check_finite, check_probability, check_std_dev, ConfigError, ConfigResult};
use crate::types::{ComplianceType, Design};

pub const WORLD_DID_PARALLEL: &str = "did-parallel";
pub const WORLD_DID_DIVERGING: &str = "did-diverging";
pub const WORLD_IV_A: &str = "iv-a";
pub const WORLD_IV_B: &str = "iv-b";
pub const WORLD_IV_C: &str = "iv-c";

pub const WORLD_NAMES: [&str; 5] = [
    WORLD_DID_PARALLEL,
    WORLD_DID_DIVERGING,
    WORLD_IV_A,
    WORLD_IV_B,
    WORLD_IV_C,
];

// ── DID ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidScenario {
    pub world: String,
    pub n: usize,
    pub pre_mean: f64,
    pub pre_sd: f64,
    pub population_mean: f64,
    pub population_sd: f64,
    /// Assignment cut-off on `pre_outcome` (inclusive).
    pub threshold: f64,
    pub intercept: f64,
    /// Slope k of both potential outcomes on `pre_outcome`.
    pub trend_slope: f64,
    /// Y(1) − Y(0) shift; the ATT.
    pub effect: f64,
    pub outcome_sd: f64,
}

impl Default for DidScenario {
    fn default() -> Self {
        Self::parallel_trends()
    }
}

impl DidScenario {
    pub fn parallel_trends() -> Self {
        Self {
            world: WORLD_DID_PARALLEL.to_string(),
            n: DEFAULT_SAMPLE_SIZE,
            pre_mean: DID_PRE_MEAN,
            pre_sd: DID_PRE_SD,
            population_mean: DID_POPULATION_MEAN,
            population_sd: DID_POPULATION_SD,
            threshold: DID_THRESHOLD,
            intercept: DID_INTERCEPT,
            trend_slope: DID_PARALLEL_SLOPE,
            effect: DID_EFFECT,
            outcome_sd: DID_OUTCOME_SD,
        }
    }

    pub fn diverging_trends() -> Self {
        Self {
            world: WORLD_DID_DIVERGING.to_string(),
            trend_slope: DID_DIVERGING_SLOPE,
            ..Self::parallel_trends()
        }
    }

    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Population ATT; the slope cancels in Y(1) − Y(0).
    pub fn true_att(&self) -> f64 {
        self.effect
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.n == 0 {
            return Err(ConfigError::EmptySample);
        }
        check_finite("pre_mean", self.pre_mean)?;
        check_std_dev("pre_sd", self.pre_sd)?;
        check_finite("population_mean", self.population_mean)?;
        check_std_dev("population_sd", self.population_sd)?;
        check_finite("threshold", self.threshold)?;
        check_finite("intercept", self.intercept)?;
        check_finite("trend_slope", self.trend_slope)?;
        check_finite("effect", self.effect)?;
        check_std_dev("outcome_sd", self.outcome_sd)?;
        Ok(())
    }
}

// ── IV ──────────────────────────────────────────────────────────────

/// Share and potential-outcome means of one compliance type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceParams {
    pub share: f64,
    pub mean_y0: f64,
    pub mean_y1: f64,
}

impl ComplianceParams {
    fn new(share: f64, (mean_y0, mean_y1): (f64, f64)) -> Self {
        Self {
            share,
            mean_y0,
            mean_y1,
        }
    }
}

/// Per-type mapping table for the latent compliance draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceTable {
    pub complier: ComplianceParams,
    pub always_taker: ComplianceParams,
    pub never_taker: ComplianceParams,
}

impl Default for ComplianceTable {
    fn default() -> Self {
        Self {
            complier: ComplianceParams::new(IV_COMPLIER_SHARE, IV_COMPLIER_MEANS),
            always_taker: ComplianceParams::new(IV_ALWAYS_TAKER_SHARE, IV_ALWAYS_TAKER_MEANS),
            never_taker: ComplianceParams::new(IV_NEVER_TAKER_SHARE, IV_NEVER_TAKER_MEANS),
        }
    }
}

impl ComplianceTable {
    #[inline]
    pub fn params(&self, kind: ComplianceType) -> &ComplianceParams {
        match kind {
            ComplianceType::Complier => &self.complier,
            ComplianceType::AlwaysTaker => &self.always_taker,
            ComplianceType::NeverTaker => &self.never_taker,
        }
    }

    /// Shares in [`ComplianceType::ALL`] order.
    pub fn shares(&self) -> [f64; 3] {
        ComplianceType::ALL.map(|t| self.params(t).share)
    }

    fn validate(&self) -> ConfigResult<()> {
        for kind in ComplianceType::ALL {
            let p = self.params(kind);
            check_probability("compliance share", p.share)?;
            check_finite("compliance mean_y0", p.mean_y0)?;
            check_finite("compliance mean_y1", p.mean_y1)?;
        }
        let sum: f64 = self.shares().iter().sum();
        if (sum - 1.0).abs() > PROPORTION_TOLERANCE {
            return Err(ConfigError::SharesDoNotSumToOne { sum });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvScenario {
    pub world: String,
    pub n: usize,
    /// P(Z = 1).
    pub instrument_prob: f64,
    pub compliance: ComplianceTable,
    pub residual_sd: f64,
    /// θ: direct effect of Z on both potential outcomes.
    pub exclusion_leakage: f64,
    /// When false, D is drawn independently of Z.
    pub instrument_relevant: bool,
    /// P(D = 1) used when the instrument is irrelevant.
    pub random_treatment_prob: f64,
}

impl Default for IvScenario {
    fn default() -> Self {
        Self::world_a()
    }
}

impl IvScenario {
    pub fn world_a() -> Self {
        Self {
            world: WORLD_IV_A.to_string(),
            n: DEFAULT_SAMPLE_SIZE,
            instrument_prob: IV_INSTRUMENT_PROB,
            compliance: ComplianceTable::default(),
            residual_sd: IV_RESIDUAL_SD,
            exclusion_leakage: 0.0,
            instrument_relevant: true,
            random_treatment_prob: IV_RANDOM_TREATMENT_PROB,
        }
    }

    pub fn world_b() -> Self {
        Self {
            world: WORLD_IV_B.to_string(),
            exclusion_leakage: IV_LEAKAGE,
            ..Self::world_a()
        }
    }

    pub fn world_c() -> Self {
        Self {
            world: WORLD_IV_C.to_string(),
            instrument_relevant: false,
            ..Self::world_a()
        }
    }

    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Complier average causal effect implied by the mean table.
    pub fn true_cace(&self) -> f64 {
        self.compliance.complier.mean_y1 - self.compliance.complier.mean_y0
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.n == 0 {
            return Err(ConfigError::EmptySample);
        }
        check_probability("instrument_prob", self.instrument_prob)?;
        check_probability("random_treatment_prob", self.random_treatment_prob)?;
        self.compliance.validate()?;
        check_std_dev("residual_sd", self.residual_sd)?;
        check_finite("exclusion_leakage", self.exclusion_leakage)?;
        Ok(())
    }
}

// ── Either family ───────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "design", rename_all = "snake_case")]
pub enum Scenario {
    Did(DidScenario),
    Iv(IvScenario),
}

impl Scenario {
    /// Look up a named preset.
    pub fn preset(world: &str) -> ConfigResult<Self> {
        match world {
            WORLD_DID_PARALLEL => Ok(Scenario::Did(DidScenario::parallel_trends())),
            WORLD_DID_DIVERGING => Ok(Scenario::Did(DidScenario::diverging_trends())),
            WORLD_IV_A => Ok(Scenario::Iv(IvScenario::world_a())),
            WORLD_IV_B => Ok(Scenario::Iv(IvScenario::world_b())),
            WORLD_IV_C => Ok(Scenario::Iv(IvScenario::world_c())),
            other => Err(ConfigError::UnknownWorld(other.to_string())),
        }
    }

    /// All presets in [`WORLD_NAMES`] order.
    pub fn presets() -> Vec<Self> {
        vec![
            Scenario::Did(DidScenario::parallel_trends()),
            Scenario::Did(DidScenario::diverging_trends()),
            Scenario::Iv(IvScenario::world_a()),
            Scenario::Iv(IvScenario::world_b()),
            Scenario::Iv(IvScenario::world_c()),
        ]
    }

    /// Parse and validate a JSON scenario, e.g. `{"design": "iv", "n": 500}`.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let scenario: Scenario =
            serde_json::from_str(json).map_err(|e| ConfigError::ScenarioFile {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let file_err = |reason: String| ConfigError::ScenarioFile {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        let scenario: Scenario =
            serde_json::from_str(&text).map_err(|e| file_err(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn world(&self) -> &str {
        match self {
            Scenario::Did(s) => &s.world,
            Scenario::Iv(s) => &s.world,
        }
    }

    pub fn design(&self) -> Design {
        match self {
            Scenario::Did(_) => Design::Did,
            Scenario::Iv(_) => Design::Iv,
        }
    }

    pub fn n(&self) -> usize {
        match self {
            Scenario::Did(s) => s.n,
            Scenario::Iv(s) => s.n,
        }
    }

    pub fn with_sample_size(self, n: usize) -> Self {
        match self {
            Scenario::Did(s) => Scenario::Did(s.with_sample_size(n)),
            Scenario::Iv(s) => Scenario::Iv(s.with_sample_size(n)),
        }
    }

    /// Ground truth the estimators target: ATT for DID, CACE for IV.
    pub fn true_effect(&self) -> f64 {
        match self {
            Scenario::Did(s) => s.true_att(),
            Scenario::Iv(s) => s.true_cace(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Scenario::Did(s) => s.validate(),
            Scenario::Iv(s) => s.validate(),
        }
    }
}
