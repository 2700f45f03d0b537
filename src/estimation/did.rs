//! DID estimators on the per-unit change `Δ = observed_outcome − pre_outcome`.
//!
//! [`DidRegression`] fits `Δ ~ 1 + assignment + population`. Without the
//! covariate, the assignment coefficient is exactly [`DidTwoByTwo`]: treated
//! mean change minus control mean change.

use nalgebra::DVector;

use crate::types::{Dataset, DidDataset};

use super::linear::{design_with_intercept, ols, Coefficient, SeKind};
use super::{EffectEstimator, EstimationResult, Method};

/// Regression-adjusted DID; coefficient on assignment is the ATT.
#[derive(Clone, Copy, Debug, Default)]
pub struct DidRegression {
    pub se_kind: SeKind,
}

impl DidRegression {
    pub fn new(se_kind: SeKind) -> Self {
        Self { se_kind }
    }
}

impl EffectEstimator<DidDataset> for DidRegression {
    fn method(&self) -> Method {
        Method::DidRegression
    }

    fn estimate(&self, data: &DidDataset) -> EstimationResult {
        let n = data.len();
        let assignment: Vec<f64> = data.units.iter().map(|u| u.assignment as u8 as f64).collect();
        let population: Vec<f64> = data.units.iter().map(|u| u.population).collect();
        let change = DVector::from_iterator(n, data.units.iter().map(|u| u.outcome_change()));

        let design = design_with_intercept(n, &[&assignment, &population]);
        let fit = ols(&design, &change, self.se_kind);

        EstimationResult::from_coefficient(
            data.world(),
            self.method(),
            n,
            fit.coefficient(1),
            fit.rank_deficient,
        )
    }
}

/// Classic two-group, two-period DID with a Welch standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DidTwoByTwo;

#[derive(Default)]
struct GroupMoments {
    n: usize,
    sum: f64,
    sum_sq: f64,
}

impl GroupMoments {
    fn push(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    fn mean(&self) -> f64 {
        self.sum / self.n as f64
    }

    /// Sample variance of the group mean, `s² / n`.
    fn mean_variance(&self) -> f64 {
        let n = self.n as f64;
        let s2 = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        s2.max(0.0) / n
    }
}

impl EffectEstimator<DidDataset> for DidTwoByTwo {
    fn method(&self) -> Method {
        Method::DidTwoByTwo
    }

    fn estimate(&self, data: &DidDataset) -> EstimationResult {
        let mut treated = GroupMoments::default();
        let mut control = GroupMoments::default();
        for u in &data.units {
            if u.assignment {
                treated.push(u.outcome_change());
            } else {
                control.push(u.outcome_change());
            }
        }

        let coef = if treated.n < 2 || control.n < 2 {
            let estimate = if treated.n > 0 && control.n > 0 {
                treated.mean() - control.mean()
            } else {
                0.0
            };
            Coefficient {
                estimate,
                std_error: f64::INFINITY,
                df: 0,
            }
        } else {
            let a = treated.mean_variance();
            let b = control.mean_variance();
            // Welch–Satterthwaite
            let denom = a * a / (treated.n - 1) as f64 + b * b / (control.n - 1) as f64;
            let df = if denom > 0.0 {
                ((a + b) * (a + b) / denom).floor() as usize
            } else {
                treated.n + control.n - 2
            };
            Coefficient {
                estimate: treated.mean() - control.mean(),
                std_error: (a + b).sqrt(),
                df: df.max(1),
            }
        };

        let degenerate = coef.std_error.is_infinite();
        EstimationResult::from_coefficient(data.world(), self.method(), data.len(), coef, degenerate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DidUnit;

    fn unit(pre: f64, population: f64, assigned: bool, post: f64) -> DidUnit {
        DidUnit {
            pre_outcome: pre,
            population,
            assignment: assigned,
            y0: post,
            y1: post,
            observed_outcome: post,
        }
    }

    fn toy() -> DidDataset {
        DidDataset {
            world: "toy".into(),
            units: vec![
                unit(10.0, 900.0, false, 15.0),
                unit(12.0, 1100.0, false, 16.0),
                unit(11.0, 1000.0, false, 16.5),
                unit(20.0, 950.0, true, 12.0),
                unit(22.0, 1050.0, true, 13.0),
                unit(21.0, 1000.0, true, 14.5),
            ],
        }
    }

    #[test]
    fn test_two_by_two_difference_of_mean_changes() {
        // control Δ = 5, 4, 5.5 → 4.8333; treated Δ = -8, -9, -6.5 → -7.8333
        let r = DidTwoByTwo.estimate(&toy());
        assert!((r.estimate - (-12.666_666_666_666_666)).abs() < 1e-9);
        assert!(r.std_error.is_finite() && r.std_error > 0.0);
        assert!(!r.degenerate);
        assert_eq!(r.method, Method::DidTwoByTwo);
        assert_eq!(r.world, "toy");
    }

    #[test]
    fn test_regression_with_balanced_covariate_matches_two_by_two() {
        // population means are equal across groups, so the adjustment term
        // β_pop·(P̄₁ − P̄₀) vanishes
        let data = toy();
        let reg = DidRegression::default().estimate(&data);
        let classic = DidTwoByTwo.estimate(&data);
        assert!((reg.estimate - classic.estimate).abs() < 1e-8);
        assert_eq!(reg.df, 3);
        assert_eq!(reg.n, 6);
    }

    #[test]
    fn test_single_group_is_degenerate_not_fatal() {
        let data = DidDataset {
            world: "all-control".into(),
            units: vec![
                unit(10.0, 900.0, false, 15.0),
                unit(12.0, 1100.0, false, 16.0),
                unit(11.0, 1000.0, false, 16.5),
            ],
        };
        let reg = DidRegression::default().estimate(&data);
        assert!(reg.degenerate);
        assert!(reg.estimate.is_finite());
        assert!(reg.std_error.is_infinite());
        assert_eq!(reg.p_value, 1.0);

        let classic = DidTwoByTwo.estimate(&data);
        assert!(classic.degenerate);
        assert_eq!(classic.estimate, 0.0);
    }

    #[test]
    fn test_robust_and_classical_share_point_estimate() {
        let data = toy();
        let a = DidRegression::new(SeKind::Classical).estimate(&data);
        let b = DidRegression::new(SeKind::Robust).estimate(&data);
        assert!((a.estimate - b.estimate).abs() < 1e-12);
        assert!(b.std_error.is_finite());
    }
}
