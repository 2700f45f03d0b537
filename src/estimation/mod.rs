//! Effect estimators.
//!
//! | Method | Module | Data | Target |
//! |--------|--------|------|--------|
//! | [`Method::DidRegression`] | [`did`] | DID | ATT, `Δ ~ 1 + Z + population` |
//! | [`Method::DidTwoByTwo`] | [`did`] | DID | ATT, treated mean Δ − control mean Δ |
//! | [`Method::AsTreated`] | [`naive`] | DID, IV | naive `Y ~ 1 + D` contrast |
//! | [`Method::Tsls`] | [`tsls`] | IV | CACE / LATE, Z instruments D |
//!
//! Every estimator is a pure function of the dataset. None of them fail:
//! a rank-deficient solve still yields a finite estimate, flagged
//! `degenerate` and carrying an infinite standard error, so that downstream
//! bias analysis sees the unreliable repetitions instead of losing them.

pub mod did;
pub mod inference;
pub mod linear;
pub mod naive;
pub mod tsls;

pub use did::{DidRegression, DidTwoByTwo};
pub use linear::{Coefficient, SeKind};
pub use naive::AsTreated;
pub use tsls::Tsls;

use serde::{Deserialize, Serialize};

use crate::constants::WEAK_INSTRUMENT_F;
use crate::types::{Dataset, Design};

/// Estimation method identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    DidRegression,
    DidTwoByTwo,
    AsTreated,
    Tsls,
}

impl Method {
    pub const ALL: [Method; 4] = [
        Method::DidRegression,
        Method::DidTwoByTwo,
        Method::AsTreated,
        Method::Tsls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::DidRegression => "did_regression",
            Method::DidTwoByTwo => "did_two_by_two",
            Method::AsTreated => "as_treated",
            Method::Tsls => "tsls",
        }
    }

    /// Parse a CLI name; accepts the canonical names and a few aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "did_regression" | "did" | "did-regression" => Some(Method::DidRegression),
            "did_two_by_two" | "did-2x2" | "did_2x2" => Some(Method::DidTwoByTwo),
            "as_treated" | "as-treated" | "naive" | "ols" => Some(Method::AsTreated),
            "tsls" | "2sls" | "iv" => Some(Method::Tsls),
            _ => None,
        }
    }

    pub fn applies_to(&self, design: Design) -> bool {
        match self {
            Method::DidRegression | Method::DidTwoByTwo => design == Design::Did,
            Method::AsTreated => true,
            Method::Tsls => design == Design::Iv,
        }
    }
}

/// Relevance classification of an instrument from its first stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentStrength {
    /// First-stage F at or above [`WEAK_INSTRUMENT_F`].
    Strong,
    Weak,
    /// Singular first or second stage; the estimate is uninformative.
    Degenerate,
}

impl InstrumentStrength {
    pub fn classify(f_statistic: f64, degenerate: bool) -> Self {
        if degenerate || f_statistic.is_nan() {
            InstrumentStrength::Degenerate
        } else if f_statistic >= WEAK_INSTRUMENT_F {
            InstrumentStrength::Strong
        } else {
            InstrumentStrength::Weak
        }
    }
}

/// First-stage regression of treatment on the instrument.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstStage {
    pub coefficient: f64,
    pub std_error: f64,
    /// Single excluded instrument, so F = t².
    pub f_statistic: f64,
    pub strength: InstrumentStrength,
}

/// Point estimate with inference, tagged by world and method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub world: String,
    pub method: Method,
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
    pub p_value: f64,
    /// Residual degrees of freedom behind `t_stat` and `p_value`.
    pub df: usize,
    pub n: usize,
    /// Rank-deficient solve or an empty comparison group; `std_error` is +∞.
    pub degenerate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_stage: Option<FirstStage>,
}

impl EstimationResult {
    pub fn from_coefficient(
        world: &str,
        method: Method,
        n: usize,
        coef: Coefficient,
        degenerate: bool,
    ) -> Self {
        let Coefficient {
            estimate,
            std_error,
            df,
        } = coef;
        let t_stat = if std_error.is_infinite() {
            0.0
        } else if std_error > 0.0 {
            estimate / std_error
        } else if estimate == 0.0 {
            0.0
        } else {
            estimate.signum() * f64::INFINITY
        };
        Self {
            world: world.to_string(),
            method,
            estimate,
            std_error,
            t_stat,
            p_value: inference::two_sided_p_value(t_stat, df),
            df,
            n,
            degenerate,
            first_stage: None,
        }
    }

    pub fn with_first_stage(mut self, first_stage: FirstStage) -> Self {
        self.first_stage = Some(first_stage);
        self
    }

    /// Two-sided Student-t interval at `level`.
    pub fn confidence_interval(&self, level: f64) -> (f64, f64) {
        let half = inference::critical_value(self.df, level) * self.std_error;
        if half.is_nan() {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        (self.estimate - half, self.estimate + half)
    }

    pub fn covers(&self, truth: f64, level: f64) -> bool {
        let (lo, hi) = self.confidence_interval(level);
        lo <= truth && truth <= hi
    }

    /// False for degenerate solves and for non-strong instruments.
    pub fn is_reliable(&self) -> bool {
        !self.degenerate
            && self
                .first_stage
                .map_or(true, |fs| fs.strength == InstrumentStrength::Strong)
    }
}

/// Maps a dataset to an estimate of the world's causal effect.
///
/// `Sync` so the Monte Carlo runner can share one estimator across workers.
pub trait EffectEstimator<D: Dataset>: Sync {
    fn method(&self) -> Method;

    fn estimate(&self, data: &D) -> EstimationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coef(estimate: f64, std_error: f64) -> Coefficient {
        Coefficient {
            estimate,
            std_error,
            df: 100,
        }
    }

    #[test]
    fn test_method_names_roundtrip() {
        for m in Method::ALL {
            assert_eq!(Method::parse(m.as_str()), Some(m));
        }
        assert_eq!(Method::parse("2sls"), Some(Method::Tsls));
        assert_eq!(Method::parse("probit"), None);
    }

    #[test]
    fn test_method_design_compatibility() {
        assert!(Method::DidRegression.applies_to(Design::Did));
        assert!(!Method::DidRegression.applies_to(Design::Iv));
        assert!(Method::AsTreated.applies_to(Design::Did));
        assert!(Method::AsTreated.applies_to(Design::Iv));
        assert!(!Method::Tsls.applies_to(Design::Did));
    }

    #[test]
    fn test_result_inference_fields() {
        let r = EstimationResult::from_coefficient("w", Method::Tsls, 102, coef(-1.5, 0.5), false);
        assert!((r.t_stat + 3.0).abs() < 1e-12);
        assert!(r.p_value < 0.01 && r.p_value > 0.0);
        let (lo, hi) = r.confidence_interval(0.95);
        assert!(lo < -2.4 && hi > -0.6);
        assert!(r.covers(-1.5, 0.95));
        assert!(!r.covers(0.0, 0.95));
    }

    #[test]
    fn test_infinite_se_is_uninformative() {
        let r = EstimationResult::from_coefficient(
            "w",
            Method::Tsls,
            10,
            coef(3.0, f64::INFINITY),
            true,
        );
        assert_eq!(r.t_stat, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert!(r.covers(1e9, 0.95));
        assert!(!r.is_reliable());
    }

    #[test]
    fn test_strength_classification() {
        assert_eq!(
            InstrumentStrength::classify(45.0, false),
            InstrumentStrength::Strong
        );
        assert_eq!(
            InstrumentStrength::classify(2.0, false),
            InstrumentStrength::Weak
        );
        assert_eq!(
            InstrumentStrength::classify(45.0, true),
            InstrumentStrength::Degenerate
        );
    }

    #[test]
    fn test_weak_first_stage_not_reliable() {
        let fs = FirstStage {
            coefficient: 0.01,
            std_error: 0.03,
            f_statistic: 0.1,
            strength: InstrumentStrength::Weak,
        };
        let r = EstimationResult::from_coefficient("w", Method::Tsls, 102, coef(2.0, 9.0), false)
            .with_first_stage(fs);
        assert!(!r.is_reliable());
    }
}
