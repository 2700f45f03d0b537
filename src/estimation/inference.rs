//! Student-t reference distribution for p-values and interval widths.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

fn reference(df: usize) -> Option<StudentsT> {
    if df == 0 {
        return None;
    }
    StudentsT::new(0.0, 1.0, df as f64).ok()
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
///
/// An infinite statistic gives 0, a zero-df or NaN statistic gives 1.
pub fn two_sided_p_value(t_stat: f64, df: usize) -> f64 {
    if t_stat.is_nan() || df == 0 {
        return 1.0;
    }
    if t_stat.is_infinite() {
        return 0.0;
    }
    let tail = match reference(df) {
        Some(dist) => dist.sf(t_stat.abs()),
        None => standard_normal().sf(t_stat.abs()),
    };
    (2.0 * tail).clamp(0.0, 1.0)
}

/// Half-width multiplier of a two-sided interval at `level` (e.g. 0.95).
pub fn critical_value(df: usize, level: f64) -> f64 {
    if df == 0 {
        return f64::INFINITY;
    }
    let q = 0.5 + level.clamp(0.0, 1.0) / 2.0;
    match reference(df) {
        Some(dist) => dist.inverse_cdf(q),
        None => standard_normal().inverse_cdf(q),
    }
}

fn standard_normal() -> Normal {
    Normal::standard()
}
