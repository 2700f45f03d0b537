//! Dispatch from named worlds and methods to concrete runs.
//!
//! Generators and estimators are generic; this module is where a
//! [`Scenario`] and a [`Method`] are matched up, incompatible pairs are
//! rejected, and grid sweeps are collected into a [`BiasTable`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::estimation::{
    AsTreated, DidRegression, DidTwoByTwo, EffectEstimator, EstimationResult, Method, SeKind, Tsls,
};
use crate::generators::{DataGenerator, DidGenerator, IvGenerator};
use crate::random::RandomStream;
use crate::scenario::{DidScenario, IvScenario, Scenario};
use crate::types::{DidDataset, IvDataset};

use super::engine::MonteCarloRunner;
use super::statistics::BiasResult;

fn incompatible(scenario: &Scenario, method: Method) -> ConfigError {
    ConfigError::IncompatibleMethod {
        method: method.as_str(),
        design: scenario.design().as_str(),
        world: scenario.world().to_string(),
    }
}

// ── Single cell ─────────────────────────────────────────────────────

/// Monte Carlo run of one (world, method) pair against the world's truth.
pub fn run_cell(
    scenario: &Scenario,
    method: Method,
    se_kind: SeKind,
    runner: &MonteCarloRunner,
) -> ConfigResult<BiasResult> {
    let truth = scenario.true_effect();
    match scenario {
        Scenario::Did(s) => {
            let generator = DidGenerator::new(s.clone())?;
            match method {
                Method::DidRegression => {
                    Ok(runner.run(&generator, &DidRegression::new(se_kind), truth))
                }
                Method::DidTwoByTwo => Ok(runner.run(&generator, &DidTwoByTwo, truth)),
                Method::AsTreated => Ok(runner.run(&generator, &AsTreated::new(se_kind), truth)),
                Method::Tsls => Err(incompatible(scenario, method)),
            }
        }
        Scenario::Iv(s) => {
            let generator = IvGenerator::new(s.clone())?;
            match method {
                Method::AsTreated => Ok(runner.run(&generator, &AsTreated::new(se_kind), truth)),
                Method::Tsls => Ok(runner.run(&generator, &Tsls::new(se_kind), truth)),
                Method::DidRegression | Method::DidTwoByTwo => Err(incompatible(scenario, method)),
            }
        }
    }
}

// ── Single dataset ──────────────────────────────────────────────────

/// One generated dataset of either family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "design", rename_all = "snake_case")]
pub enum GeneratedData {
    Did(DidDataset),
    Iv(IvDataset),
}

/// Draw one dataset from `scenario` with a stream seeded by `seed`.
pub fn generate_once(scenario: &Scenario, seed: u64) -> ConfigResult<GeneratedData> {
    let mut rng = RandomStream::from_seed(seed);
    Ok(match scenario {
        Scenario::Did(s) => GeneratedData::Did(DidGenerator::new(s.clone())?.generate(&mut rng)),
        Scenario::Iv(s) => GeneratedData::Iv(IvGenerator::new(s.clone())?.generate(&mut rng)),
    })
}

fn estimate_did(data: &DidDataset, method: Method, se_kind: SeKind) -> Option<EstimationResult> {
    match method {
        Method::DidRegression => Some(DidRegression::new(se_kind).estimate(data)),
        Method::DidTwoByTwo => Some(DidTwoByTwo.estimate(data)),
        Method::AsTreated => Some(AsTreated::new(se_kind).estimate(data)),
        Method::Tsls => None,
    }
}

fn estimate_iv(data: &IvDataset, method: Method, se_kind: SeKind) -> Option<EstimationResult> {
    match method {
        Method::AsTreated => Some(AsTreated::new(se_kind).estimate(data)),
        Method::Tsls => Some(Tsls::new(se_kind).estimate(data)),
        Method::DidRegression | Method::DidTwoByTwo => None,
    }
}

impl GeneratedData {
    pub fn world(&self) -> &str {
        match self {
            GeneratedData::Did(d) => &d.world,
            GeneratedData::Iv(d) => &d.world,
        }
    }

    /// Apply `method`; `None` when it does not apply to this design.
    pub fn estimate(&self, method: Method, se_kind: SeKind) -> Option<EstimationResult> {
        let result = match self {
            GeneratedData::Did(d) => estimate_did(d, method, se_kind),
            GeneratedData::Iv(d) => estimate_iv(d, method, se_kind),
        }?;
        if result.degenerate {
            warn!(
                world = %result.world,
                method = method.as_str(),
                "degenerate estimate; standard error is infinite"
            );
        }
        Some(result)
    }

    /// Every applicable method, in [`Method::ALL`] order.
    pub fn estimate_all(&self, se_kind: SeKind) -> Vec<EstimationResult> {
        Method::ALL
            .iter()
            .filter_map(|&m| self.estimate(m, se_kind))
            .collect()
    }
}

/// Generate one dataset and apply one method to it.
pub fn estimate_once(
    scenario: &Scenario,
    method: Method,
    se_kind: SeKind,
    seed: u64,
) -> ConfigResult<EstimationResult> {
    if !method.applies_to(scenario.design()) {
        return Err(incompatible(scenario, method));
    }
    generate_once(scenario, seed)?
        .estimate(method, se_kind)
        .ok_or_else(|| incompatible(scenario, method))
}

// ── Grid ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiasTable {
    pub seed: u64,
    pub reps: usize,
    pub rows: Vec<BiasResult>,
}

impl BiasTable {
    /// DID worlds with the regression-adjusted estimator; IV worlds with the
    /// as-treated contrast and TSLS.
    pub fn default_grid() -> Vec<(Scenario, Method)> {
        vec![
            (Scenario::Did(DidScenario::parallel_trends()), Method::DidRegression),
            (Scenario::Did(DidScenario::diverging_trends()), Method::DidRegression),
            (Scenario::Iv(IvScenario::world_a()), Method::AsTreated),
            (Scenario::Iv(IvScenario::world_a()), Method::Tsls),
            (Scenario::Iv(IvScenario::world_b()), Method::AsTreated),
            (Scenario::Iv(IvScenario::world_b()), Method::Tsls),
            (Scenario::Iv(IvScenario::world_c()), Method::AsTreated),
            (Scenario::Iv(IvScenario::world_c()), Method::Tsls),
        ]
    }

    pub fn find(&self, world: &str, method: Method) -> Option<&BiasResult> {
        self.rows
            .iter()
            .find(|r| r.world == world && r.method == method)
    }
}

/// Run explicit (world, method) cells in order. Incompatible cells are errors.
pub fn run_grid(
    cells: &[(Scenario, Method)],
    se_kind: SeKind,
    runner: &MonteCarloRunner,
) -> ConfigResult<BiasTable> {
    let mut rows = Vec::with_capacity(cells.len());
    for (scenario, method) in cells {
        info!(world = scenario.world(), method = method.as_str(), "sweep cell");
        rows.push(run_cell(scenario, *method, se_kind, runner)?);
    }
    Ok(BiasTable {
        seed: runner.seed(),
        reps: runner.reps(),
        rows,
    })
}

/// Cartesian sweep of `scenarios × methods`, skipping incompatible pairs.
pub fn run_sweep(
    scenarios: &[Scenario],
    methods: &[Method],
    runner: &MonteCarloRunner,
) -> ConfigResult<BiasTable> {
    let mut cells = Vec::new();
    for scenario in scenarios {
        for &method in methods {
            if method.applies_to(scenario.design()) {
                cells.push((scenario.clone(), method));
            } else {
                debug!(
                    world = scenario.world(),
                    method = method.as_str(),
                    "skipping incompatible cell"
                );
            }
        }
    }
    run_grid(&cells, SeKind::default(), runner)
}
