//! Closed-form least squares on top of nalgebra's SVD.
//!
//! [`fit`] covers both OLS and the second stage of TSLS: coefficients come
//! from regressing `y` on `design`, residuals are formed against
//! `structural` (the same matrix for OLS, the un-projected regressors for
//! TSLS). Writing `design = U·S·Vᵀ`, the bread `(XᵀX)⁻¹` is `V·S⁻²·Vᵀ`, which
//! avoids forming and inverting `XᵀX`.
//!
//! A design whose smallest singular value falls below
//! `SINGULAR_TOLERANCE × largest` is rank-deficient: the minimum-norm
//! solution is returned (finite) and every variance is `+∞`. The same happens
//! when there are no residual degrees of freedom.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::constants::SINGULAR_TOLERANCE;

/// Coefficient covariance estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeKind {
    /// Homoskedastic `σ²·(XᵀX)⁻¹`.
    #[default]
    Classical,
    /// HC1 sandwich with the `n / (n − k)` small-sample factor.
    Robust,
}

/// One coefficient with its standard error and residual degrees of freedom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub df: usize,
}

#[derive(Clone, Debug)]
pub struct LinearFit {
    pub coefficients: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub residuals: DVector<f64>,
    pub df_resid: usize,
    pub rank_deficient: bool,
}

impl LinearFit {
    pub fn coefficient(&self, j: usize) -> Coefficient {
        let var = self.covariance[(j, j)];
        let std_error = if var.is_nan() || var < 0.0 {
            f64::INFINITY
        } else {
            var.sqrt()
        };
        Coefficient {
            estimate: self.coefficients[j],
            std_error,
            df: self.df_resid,
        }
    }
}

/// Build a design matrix with a leading intercept column.
pub fn design_with_intercept(n: usize, columns: &[&[f64]]) -> DMatrix<f64> {
    DMatrix::from_fn(n, columns.len() + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            columns[j - 1][i]
        }
    })
}

/// Ordinary least squares of `y` on `design`.
pub fn ols(design: &DMatrix<f64>, y: &DVector<f64>, se_kind: SeKind) -> LinearFit {
    fit(design, design, y, se_kind)
}

/// Least-squares projection of every column of `target` onto `basis`.
pub fn project(basis: &DMatrix<f64>, target: &DMatrix<f64>) -> DMatrix<f64> {
    let svd = basis.clone().svd(true, true);
    let eps = svd.singular_values.max() * SINGULAR_TOLERANCE;
    match svd.solve(target, eps) {
        Ok(gamma) => basis * gamma,
        // Only reachable if U/Vᵀ were not computed, which we always request.
        Err(_) => DMatrix::zeros(target.nrows(), target.ncols()),
    }
}

/// Regress `y` on `design`; residuals are `y − structural·β`.
pub fn fit(
    design: &DMatrix<f64>,
    structural: &DMatrix<f64>,
    y: &DVector<f64>,
    se_kind: SeKind,
) -> LinearFit {
    let n = design.nrows();
    let k = design.ncols();

    let svd = design.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    let s_min = svd.singular_values.min();
    let rank_deficient = n < k
        || !s_max.is_finite()
        || s_max <= 0.0
        || s_min <= s_max * SINGULAR_TOLERANCE;

    let coefficients = svd
        .solve(y, s_max * SINGULAR_TOLERANCE)
        .unwrap_or_else(|_| DVector::zeros(k));
    let residuals = y - structural * &coefficients;
    let df_resid = n.saturating_sub(k);

    let covariance = match (&svd.v_t, rank_deficient || df_resid == 0) {
        (Some(v_t), false) => {
            let inv_sq = svd.singular_values.map(|s| 1.0 / (s * s));
            let bread = v_t.transpose() * DMatrix::from_diagonal(&inv_sq) * v_t;
            match se_kind {
                SeKind::Classical => {
                    let sigma2 = residuals.norm_squared() / df_resid as f64;
                    bread * sigma2
                }
                SeKind::Robust => {
                    let scored = DMatrix::from_fn(n, k, |i, j| design[(i, j)] * residuals[i]);
                    let meat = scored.transpose() * &scored;
                    let scale = n as f64 / df_resid as f64;
                    &bread * meat * &bread * scale
                }
            }
        }
        _ => DMatrix::from_element(k, k, f64::INFINITY),
    };

    LinearFit {
        coefficients,
        covariance,
        residuals,
        df_resid,
        rank_deficient,
    }
}
