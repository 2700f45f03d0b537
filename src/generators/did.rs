//! DID worlds.
//!
//! Per unit, in this draw order:
//!
//! ```text
//! pre        ~ N(pre_mean, pre_sd²)
//! population ~ N(population_mean, population_sd²)
//! Z          = 1[pre >= threshold]
//! Y(0)       ~ N(intercept + k·pre, outcome_sd²)
//! Y(1)       ~ N(intercept + k·pre + effect, outcome_sd²)
//! Y          = Z·Y(1) + (1 − Z)·Y(0)
//! ```
//!
//! With k = 1 the expected change `Y − pre` does not depend on `pre`, so
//! treated and control trends are parallel. With k = 2 the change grows with
//! `pre`, and because assignment selects on `pre` the control group no longer
//! stands in for the treated group's counterfactual.

use crate::error::ConfigResult;
use crate::random::RandomStream;
use crate::scenario::DidScenario;
use crate::types::{DidDataset, DidUnit};

use super::DataGenerator;

#[derive(Clone, Debug)]
pub struct DidGenerator {
    scenario: DidScenario,
}

impl DidGenerator {
    pub fn new(scenario: DidScenario) -> ConfigResult<Self> {
        scenario.validate()?;
        Ok(Self { scenario })
    }

    #[inline]
    fn draw_unit(&self, rng: &mut RandomStream) -> DidUnit {
        let s = &self.scenario;
        let pre_outcome = rng.normal(s.pre_mean, s.pre_sd);
        let population = rng.normal(s.population_mean, s.population_sd);
        let assignment = pre_outcome >= s.threshold;

        let baseline = s.intercept + s.trend_slope * pre_outcome;
        let y0 = rng.normal(baseline, s.outcome_sd);
        let y1 = rng.normal(baseline + s.effect, s.outcome_sd);

        DidUnit {
            pre_outcome,
            population,
            assignment,
            y0,
            y1,
            observed_outcome: if assignment { y1 } else { y0 },
        }
    }
}

impl DataGenerator for DidGenerator {
    type Dataset = DidDataset;

    fn world(&self) -> &str {
        &self.scenario.world
    }

    fn true_effect(&self) -> f64 {
        self.scenario.true_att()
    }

    fn generate(&self, rng: &mut RandomStream) -> DidDataset {
        let units = (0..self.scenario.n).map(|_| self.draw_unit(rng)).collect();
        DidDataset {
            world: self.scenario.world.clone(),
            units,
        }
    }
}

/// Validate `scenario` and draw one dataset from it.
pub fn generate_did(scenario: &DidScenario, rng: &mut RandomStream) -> ConfigResult<DidDataset> {
    let generator = DidGenerator::new(scenario.clone())?;
    Ok(generator.generate(rng))
}
