//! As-treated OLS: `Y ~ 1 + D` on whatever treatment indicator the data has.
//!
//! On IV data, D is the received treatment and the instrument is ignored. On
//! DID data, D is the threshold assignment and the outcome is the post-period
//! level, so the contrast mixes selection on the pre-period with the effect.

use nalgebra::DVector;

use crate::types::{Dataset, DidDataset, IvDataset};

use super::linear::{design_with_intercept, ols, SeKind};
use super::{EffectEstimator, EstimationResult, Method};

#[derive(Clone, Copy, Debug, Default)]
pub struct AsTreated {
    pub se_kind: SeKind,
}

impl AsTreated {
    pub fn new(se_kind: SeKind) -> Self {
        Self { se_kind }
    }

    fn contrast(&self, world: &str, treatment: &[f64], outcome: DVector<f64>) -> EstimationResult {
        let n = treatment.len();
        let design = design_with_intercept(n, &[treatment]);
        let fit = ols(&design, &outcome, self.se_kind);
        EstimationResult::from_coefficient(
            world,
            Method::AsTreated,
            n,
            fit.coefficient(1),
            fit.rank_deficient,
        )
    }
}

impl EffectEstimator<IvDataset> for AsTreated {
    fn method(&self) -> Method {
        Method::AsTreated
    }

    fn estimate(&self, data: &IvDataset) -> EstimationResult {
        let treatment: Vec<f64> = data.units.iter().map(|u| u.treatment as u8 as f64).collect();
        let outcome = DVector::from_iterator(data.len(), data.units.iter().map(|u| u.observed_outcome));
        self.contrast(data.world(), &treatment, outcome)
    }
}

impl EffectEstimator<DidDataset> for AsTreated {
    fn method(&self) -> Method {
        Method::AsTreated
    }

    fn estimate(&self, data: &DidDataset) -> EstimationResult {
        let treatment: Vec<f64> = data.units.iter().map(|u| u.assignment as u8 as f64).collect();
        let outcome = DVector::from_iterator(data.len(), data.units.iter().map(|u| u.observed_outcome));
        self.contrast(data.world(), &treatment, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComplianceType, IvUnit};

    fn iv_unit(treatment: bool, outcome: f64) -> IvUnit {
        IvUnit {
            instrument: treatment,
            compliance: ComplianceType::Complier,
            treatment,
            y0: outcome,
            y1: outcome,
            observed_outcome: outcome,
        }
    }

    #[test]
    fn test_difference_in_means() {
        let data = IvDataset {
            world: "toy".into(),
            units: vec![
                iv_unit(true, -2.0),
                iv_unit(true, -3.0),
                iv_unit(false, 0.5),
                iv_unit(false, -0.5),
                iv_unit(false, 0.0),
            ],
        };
        let r = AsTreated::default().estimate(&data);
        // treated mean -2.5, untreated mean 0
        assert!((r.estimate - (-2.5)).abs() < 1e-12);
        assert_eq!(r.df, 3);
        assert!(!r.degenerate);
        assert!(r.first_stage.is_none());
    }

    #[test]
    fn test_nobody_treated_is_degenerate() {
        let data = IvDataset {
            world: "toy".into(),
            units: vec![iv_unit(false, 1.0), iv_unit(false, 2.0), iv_unit(false, 3.0)],
        };
        let r = AsTreated::default().estimate(&data);
        assert!(r.degenerate);
        assert!(r.estimate.is_finite());
        assert!(r.std_error.is_infinite());
    }

    #[test]
    fn test_did_data_uses_assignment_and_levels() {
        let unit = |pre: f64, assigned: bool, post: f64| crate::types::DidUnit {
            pre_outcome: pre,
            population: 1000.0,
            assignment: assigned,
            y0: post,
            y1: post,
            observed_outcome: post,
        };
        let data = DidDataset {
            world: "toy".into(),
            units: vec![
                unit(130.0, true, 120.0),
                unit(125.0, true, 110.0),
                unit(90.0, false, 125.0),
                unit(95.0, false, 135.0),
            ],
        };
        let r = AsTreated::default().estimate(&data);
        assert!((r.estimate - (-15.0)).abs() < 1e-12);
        assert_eq!(r.method, Method::AsTreated);
    }
}
