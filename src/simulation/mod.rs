//! Monte Carlo bias analysis.
//!
//! - [`engine`]: repeated (generate, estimate) cycles in parallel
//! - [`statistics`]: streaming reduction into a [`BiasResult`]
//! - [`sweep`]: world × method dispatch, single-dataset runs, grids

pub mod engine;
pub mod statistics;
pub mod sweep;

// Re-export commonly used items
pub use engine::MonteCarloRunner;
pub use statistics::{BiasResult, EstimateStats};
pub use sweep::{
    estimate_once, generate_once, run_cell, run_grid, run_sweep, BiasTable, GeneratedData,
};
