//! Two-stage least squares with one binary instrument.
//!
//! Stage one projects the regressors `X = [1, D]` onto the instrument basis
//! `Z = [1, Z]`; stage two regresses `Y` on the projection `X̂`. Residuals
//! for the variance use the structural `X`, not `X̂`. With a single binary
//! instrument the slope equals the Wald ratio `cov(Z, Y) / cov(Z, D)`.
//!
//! The first stage `D ~ 1 + Z` is reported alongside the estimate. A
//! near-zero first stage makes `X̂` collinear: the estimate stays finite but
//! is flagged degenerate with an infinite standard error.

use nalgebra::{DMatrix, DVector};

use crate::types::{Dataset, IvDataset};

use super::linear::{design_with_intercept, fit, ols, project, SeKind};
use super::{EffectEstimator, EstimationResult, FirstStage, InstrumentStrength, Method};

#[derive(Clone, Copy, Debug, Default)]
pub struct Tsls {
    pub se_kind: SeKind,
}

impl Tsls {
    pub fn new(se_kind: SeKind) -> Self {
        Self { se_kind }
    }
}

impl EffectEstimator<IvDataset> for Tsls {
    fn method(&self) -> Method {
        Method::Tsls
    }

    fn estimate(&self, data: &IvDataset) -> EstimationResult {
        let n = data.len();
        let instrument: Vec<f64> = data.units.iter().map(|u| u.instrument as u8 as f64).collect();
        let treatment: Vec<f64> = data.units.iter().map(|u| u.treatment as u8 as f64).collect();
        let outcome = DVector::from_iterator(n, data.units.iter().map(|u| u.observed_outcome));

        let z = design_with_intercept(n, &[&instrument]);
        let x = design_with_intercept(n, &[&treatment]);

        // ── First stage ──
        let d = DVector::from_vec(treatment.clone());
        let first = ols(&z, &d, SeKind::Classical);
        let pi = first.coefficient(1);
        let f_statistic = if first.rank_deficient || !pi.std_error.is_finite() {
            0.0
        } else if pi.std_error > 0.0 {
            (pi.estimate / pi.std_error).powi(2)
        } else {
            // D perfectly determined by Z
            f64::INFINITY
        };

        // ── Second stage ──
        let x_hat: DMatrix<f64> = project(&z, &x);
        let second = fit(&x_hat, &x, &outcome, self.se_kind);

        let strength =
            InstrumentStrength::classify(f_statistic, first.rank_deficient || second.rank_deficient);
        let first_stage = FirstStage {
            coefficient: pi.estimate,
            std_error: pi.std_error,
            f_statistic,
            strength,
        };

        EstimationResult::from_coefficient(
            data.world(),
            self.method(),
            n,
            second.coefficient(1),
            second.rank_deficient,
        )
        .with_first_stage(first_stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::generate_iv;
    use crate::random::RandomStream;
    use crate::scenario::IvScenario;
    use crate::types::{ComplianceType, IvUnit};

    fn unit(instrument: bool, treatment: bool, outcome: f64) -> IvUnit {
        IvUnit {
            instrument,
            compliance: ComplianceType::Complier,
            treatment,
            y0: outcome,
            y1: outcome,
            observed_outcome: outcome,
        }
    }

    #[test]
    fn test_wald_ratio_on_toy_data() {
        // E[D|Z=1] − E[D|Z=0] = 0.75 − 0.25; E[Y|Z=1] − E[Y|Z=0] = −1 − (−0.5)
        let data = IvDataset {
            world: "toy".into(),
            units: vec![
                unit(true, true, -1.0),
                unit(true, true, -2.0),
                unit(true, true, -1.5),
                unit(true, false, 0.5),
                unit(false, true, -2.0),
                unit(false, false, 0.3),
                unit(false, false, 0.1),
                unit(false, false, -0.4),
            ],
        };
        let r = Tsls::default().estimate(&data);
        assert!((r.estimate - (-1.0)).abs() < 1e-10, "estimate={}", r.estimate);
        let fs = r.first_stage.unwrap();
        assert!((fs.coefficient - 0.5).abs() < 1e-12);
        assert!(fs.f_statistic > 0.0);
        assert!(r.std_error.is_finite());
        assert_eq!(r.df, 6);
    }

    #[test]
    fn test_matches_covariance_ratio_on_generated_data() {
        let scenario = IvScenario::world_a().with_sample_size(2_000);
        let data = generate_iv(&scenario, &mut RandomStream::from_seed(3)).unwrap();
        let n = data.len() as f64;
        let z: Vec<f64> = data.units.iter().map(|u| u.instrument as u8 as f64).collect();
        let d: Vec<f64> = data.units.iter().map(|u| u.treatment as u8 as f64).collect();
        let y: Vec<f64> = data.units.iter().map(|u| u.observed_outcome).collect();
        let mean = |v: &[f64]| v.iter().sum::<f64>() / n;
        let cov = |a: &[f64], b: &[f64]| {
            let (ma, mb) = (mean(a), mean(b));
            a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum::<f64>() / n
        };
        let wald = cov(&z, &y) / cov(&z, &d);

        let r = Tsls::default().estimate(&data);
        assert!((r.estimate - wald).abs() < 1e-8, "{} vs {}", r.estimate, wald);
        let fs = r.first_stage.unwrap();
        assert_eq!(fs.strength, InstrumentStrength::Strong);
        assert!(r.is_reliable());
    }

    #[test]
    fn test_constant_instrument_is_degenerate() {
        let data = IvDataset {
            world: "toy".into(),
            units: vec![
                unit(true, true, -1.0),
                unit(true, false, 0.0),
                unit(true, true, -2.0),
                unit(true, false, 0.5),
            ],
        };
        let r = Tsls::default().estimate(&data);
        assert!(r.degenerate);
        assert!(r.estimate.is_finite());
        assert!(r.std_error.is_infinite());
        assert_eq!(r.p_value, 1.0);
        let fs = r.first_stage.unwrap();
        assert_eq!(fs.strength, InstrumentStrength::Degenerate);
        assert_eq!(fs.f_statistic, 0.0);
        assert!(!r.is_reliable());
    }

    #[test]
    fn test_zero_first_stage_is_degenerate() {
        // E[D|Z=1] = E[D|Z=0] = 0.5 exactly
        let data = IvDataset {
            world: "toy".into(),
            units: vec![
                unit(true, true, -1.0),
                unit(true, false, 0.2),
                unit(false, true, -2.0),
                unit(false, false, 0.5),
            ],
        };
        let r = Tsls::default().estimate(&data);
        assert!(r.degenerate);
        assert!(r.estimate.is_finite());
        assert_eq!(r.first_stage.unwrap().strength, InstrumentStrength::Degenerate);
    }
}
