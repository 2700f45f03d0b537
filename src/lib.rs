//! # Causal Lab: estimator bias under violated identification assumptions
//!
//! Simulates worlds whose causal effect is known, applies standard
//! estimators to each simulated dataset, and measures how far the estimates
//! land from the truth when an identifying assumption holds or fails.
//!
//! ## Worlds
//!
//! | World | Design | Assumption | Truth |
//! |-------|--------|------------|-------|
//! | `did-parallel` | DID, slope k = 1 | parallel trends holds | ATT −40 |
//! | `did-diverging` | DID, slope k = 2 | parallel trends fails | ATT −40 |
//! | `iv-a` | IV | relevance, exclusion, monotonicity hold | CACE −1.5 |
//! | `iv-b` | IV | exclusion fails (θ = −0.5) | CACE −1.5 |
//! | `iv-c` | IV | relevance fails | CACE −1.5 |
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | Configure | [`scenario`] | Presets and JSON overrides, validated up front |
//! | Generate | [`generators`] | One parametrized generator per design family |
//! | Estimate | [`estimation`] | DID regression and 2×2, as-treated OLS, TSLS |
//! | Repeat | [`simulation`] | Parallel Monte Carlo with a deterministic reduction |
//!
//! Every random draw comes from an explicit [`random::RandomStream`]; the
//! same seed and configuration always give the same datasets and the same
//! [`simulation::BiasResult`], independent of the thread count.

pub mod constants;
pub mod env_config;
pub mod error;
pub mod estimation;
pub mod generators;
pub mod random;
pub mod scenario;
pub mod simulation;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use estimation::{EffectEstimator, EstimationResult, Method, SeKind};
pub use generators::DataGenerator;
pub use scenario::Scenario;
pub use simulation::{BiasResult, BiasTable, MonteCarloRunner};
