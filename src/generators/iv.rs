//! IV worlds.
//!
//! Per unit, in this draw order:
//!
//! ```text
//! Z    ~ Bernoulli(instrument_prob)
//! type ~ Categorical(complier, always-taker, never-taker shares)
//! Y(0) ~ N(mean_y0[type] + θ·Z, residual_sd²)
//! Y(1) ~ N(mean_y1[type] + θ·Z, residual_sd²)      (independent noise)
//! D    = D_type(Z)                    if the instrument is relevant
//!      ~ Bernoulli(random_treatment_prob)   otherwise
//! Y    = D·Y(1) + (1 − D)·Y(0)
//! ```
//!
//! θ = `exclusion_leakage` is zero unless the exclusion restriction is broken.
//! The Bernoulli draw for an irrelevant instrument happens after the outcome
//! draws, so worlds A and C share Z, type, and potential outcomes for a seed.

use rand::distr::weighted::WeightedIndex;

use crate::error::{ConfigError, ConfigResult};
use crate::random::RandomStream;
use crate::scenario::IvScenario;
use crate::types::{ComplianceType, IvDataset, IvUnit};

use super::DataGenerator;

#[derive(Clone, Debug)]
pub struct IvGenerator {
    scenario: IvScenario,
    /// Compliance-type draw over [`ComplianceType::ALL`].
    compliance_draw: WeightedIndex<f64>,
}

impl IvGenerator {
    pub fn new(scenario: IvScenario) -> ConfigResult<Self> {
        scenario.validate()?;
        let shares = scenario.compliance.shares();
        let compliance_draw =
            WeightedIndex::new(shares).map_err(|_| ConfigError::SharesDoNotSumToOne {
                sum: shares.iter().sum(),
            })?;
        Ok(Self {
            scenario,
            compliance_draw,
        })
    }

    #[inline]
    fn draw_unit(&self, rng: &mut RandomStream) -> IvUnit {
        let s = &self.scenario;
        let instrument = rng.bernoulli(s.instrument_prob);
        let compliance = ComplianceType::ALL[rng.weighted(&self.compliance_draw)];

        let params = s.compliance.params(compliance);
        let leakage = if instrument { s.exclusion_leakage } else { 0.0 };
        let y0 = rng.normal(params.mean_y0 + leakage, s.residual_sd);
        let y1 = rng.normal(params.mean_y1 + leakage, s.residual_sd);

        let treatment = if s.instrument_relevant {
            compliance.potential_treatment(instrument)
        } else {
            rng.bernoulli(s.random_treatment_prob)
        };

        IvUnit {
            instrument,
            compliance,
            treatment,
            y0,
            y1,
            observed_outcome: if treatment { y1 } else { y0 },
        }
    }
}

impl DataGenerator for IvGenerator {
    type Dataset = IvDataset;

    fn world(&self) -> &str {
        &self.scenario.world
    }

    fn true_effect(&self) -> f64 {
        self.scenario.true_cace()
    }

    fn generate(&self, rng: &mut RandomStream) -> IvDataset {
        let units = (0..self.scenario.n).map(|_| self.draw_unit(rng)).collect();
        IvDataset {
            world: self.scenario.world.clone(),
            units,
        }
    }
}

/// Validate `scenario` and draw one dataset from it.
pub fn generate_iv(scenario: &IvScenario, rng: &mut RandomStream) -> ConfigResult<IvDataset> {
    let generator = IvGenerator::new(scenario.clone())?;
    Ok(generator.generate(rng))
}
