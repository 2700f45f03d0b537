//! Configuration errors.
//!
//! Only configuration can fail: every check runs before the first draw, so an
//! invalid world never yields a partial dataset. Numerical trouble inside an
//! estimator is reported on the [`crate::estimation::EstimationResult`] instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample size must be at least 1")]
    EmptySample,

    #[error("repetition count must be at least 1")]
    ZeroRepetitions,

    #[error("`{field}` must be a positive, finite standard deviation (got {value})")]
    InvalidStdDev { field: &'static str, value: f64 },

    #[error("`{field}` must be a probability in [0, 1] (got {value})")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error("compliance shares must sum to 1 (got {sum})")]
    SharesDoNotSumToOne { sum: f64 },

    #[error("`{field}` must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("unknown world `{0}`")]
    UnknownWorld(String),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    #[error("method `{method}` does not apply to {design} world `{world}`")]
    IncompatibleMethod {
        method: &'static str,
        design: &'static str,
        world: String,
    },

    #[error("cannot load scenario from {path}: {reason}")]
    ScenarioFile { path: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub(crate) fn check_std_dev(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidStdDev { field, value })
    }
}

pub(crate) fn check_probability(field: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}

pub(crate) fn check_finite(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_rejects_zero_negative_and_nan() {
        assert!(check_std_dev("sd", 1.0).is_ok());
        assert_eq!(
            check_std_dev("sd", 0.0),
            Err(ConfigError::InvalidStdDev {
                field: "sd",
                value: 0.0
            })
        );
        assert!(check_std_dev("sd", -2.0).is_err());
        assert!(check_std_dev("sd", f64::NAN).is_err());
        assert!(check_std_dev("sd", f64::INFINITY).is_err());
    }

    #[test]
    fn test_probability_bounds_inclusive() {
        assert!(check_probability("p", 0.0).is_ok());
        assert!(check_probability("p", 1.0).is_ok());
        assert!(check_probability("p", 1.0 + 1e-12).is_err());
        assert!(check_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = ConfigError::InvalidStdDev {
            field: "outcome_sd",
            value: -1.0,
        };
        assert!(err.to_string().contains("outcome_sd"));
    }
}
