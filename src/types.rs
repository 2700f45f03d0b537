//! Core data structures: simulated units, datasets, and compliance types.
//!
//! Each unit carries both potential outcomes `y0`/`y1` as simulation ground
//! truth, and exactly one of them is copied into `observed_outcome` by the
//! assignment or selection rule. Estimators only read the observed columns;
//! the potential outcomes are there for ground-truth helpers such as
//! [`DidDataset::sample_att`] and [`IvDataset::sample_cace`].

use serde::{Deserialize, Serialize};

/// Study design a world belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Design {
    Did,
    Iv,
}

impl Design {
    pub fn as_str(&self) -> &'static str {
        match self {
            Design::Did => "DID",
            Design::Iv => "IV",
        }
    }
}

/// Latent response of treatment to the instrument.
///
/// Monotonicity is structural: there is no defier variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceType {
    Complier,
    AlwaysTaker,
    NeverTaker,
}

impl ComplianceType {
    /// Index order of the compliance-type draw in the IV generator.
    pub const ALL: [ComplianceType; 3] = [
        ComplianceType::Complier,
        ComplianceType::AlwaysTaker,
        ComplianceType::NeverTaker,
    ];

    /// Potential treatment D(z).
    #[inline]
    pub fn potential_treatment(self, instrument: bool) -> bool {
        match self {
            ComplianceType::Complier => instrument,
            ComplianceType::AlwaysTaker => true,
            ComplianceType::NeverTaker => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceType::Complier => "complier",
            ComplianceType::AlwaysTaker => "always_taker",
            ComplianceType::NeverTaker => "never_taker",
        }
    }
}

/// Common view of a generated dataset.
pub trait Dataset {
    fn world(&self) -> &str;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── DID ─────────────────────────────────────────────────────────────

/// One neighbourhood in a two-period DID world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DidUnit {
    pub pre_outcome: f64,
    pub population: f64,
    /// `pre_outcome >= threshold`.
    pub assignment: bool,
    pub y0: f64,
    pub y1: f64,
    pub observed_outcome: f64,
}

impl DidUnit {
    /// Post-period change used by the DID estimators.
    #[inline]
    pub fn outcome_change(&self) -> f64 {
        self.observed_outcome - self.pre_outcome
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DidDataset {
    pub world: String,
    pub units: Vec<DidUnit>,
}

impl DidDataset {
    pub fn treated_count(&self) -> usize {
        self.units.iter().filter(|u| u.assignment).count()
    }

    /// In-sample ATT: mean of `y1 - y0` over assigned units.
    pub fn sample_att(&self) -> Option<f64> {
        mean_of(
            self.units
                .iter()
                .filter(|u| u.assignment)
                .map(|u| u.y1 - u.y0),
        )
    }
}

impl Dataset for DidDataset {
    fn world(&self) -> &str {
        &self.world
    }

    fn len(&self) -> usize {
        self.units.len()
    }
}

// ── IV ──────────────────────────────────────────────────────────────

/// One individual in an IV world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IvUnit {
    pub instrument: bool,
    pub compliance: ComplianceType,
    pub treatment: bool,
    pub y0: f64,
    pub y1: f64,
    pub observed_outcome: f64,
}

/// Realized compliance mixture of a dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceShares {
    pub complier: f64,
    pub always_taker: f64,
    pub never_taker: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IvDataset {
    pub world: String,
    pub units: Vec<IvUnit>,
}

impl IvDataset {
    pub fn treated_count(&self) -> usize {
        self.units.iter().filter(|u| u.treatment).count()
    }

    /// In-sample CACE: mean of `y1 - y0` over compliers.
    pub fn sample_cace(&self) -> Option<f64> {
        mean_of(
            self.units
                .iter()
                .filter(|u| u.compliance == ComplianceType::Complier)
                .map(|u| u.y1 - u.y0),
        )
    }

    pub fn compliance_shares(&self) -> ComplianceShares {
        if self.units.is_empty() {
            return ComplianceShares::default();
        }
        let mut counts = [0usize; 3];
        for u in &self.units {
            let idx = match u.compliance {
                ComplianceType::Complier => 0,
                ComplianceType::AlwaysTaker => 1,
                ComplianceType::NeverTaker => 2,
            };
            counts[idx] += 1;
        }
        let n = self.units.len() as f64;
        ComplianceShares {
            complier: counts[0] as f64 / n,
            always_taker: counts[1] as f64 / n,
            never_taker: counts[2] as f64 / n,
        }
    }
}

impl Dataset for IvDataset {
    fn world(&self) -> &str {
        &self.world
    }

    fn len(&self) -> usize {
        self.units.len()
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did_unit(pre: f64, assigned: bool, y0: f64, y1: f64) -> DidUnit {
        DidUnit {
            pre_outcome: pre,
            population: 1000.0,
            assignment: assigned,
            y0,
            y1,
            observed_outcome: if assigned { y1 } else { y0 },
        }
    }

    #[test]
    fn test_potential_treatment_table() {
        use ComplianceType::*;
        assert!(!Complier.potential_treatment(false));
        assert!(Complier.potential_treatment(true));
        assert!(AlwaysTaker.potential_treatment(false));
        assert!(AlwaysTaker.potential_treatment(true));
        assert!(!NeverTaker.potential_treatment(false));
        assert!(!NeverTaker.potential_treatment(true));
    }

    #[test]
    fn test_sample_att_uses_only_assigned_units() {
        let data = DidDataset {
            world: "t".into(),
            units: vec![
                did_unit(120.0, true, 150.0, 110.0),
                did_unit(130.0, true, 160.0, 130.0),
                did_unit(90.0, false, 120.0, 0.0),
            ],
        };
        assert_eq!(data.treated_count(), 2);
        assert!((data.sample_att().unwrap() - (-35.0)).abs() < 1e-12);
        assert!((data.units[0].outcome_change() - (-10.0)).abs() < 1e-12);
    }

    #[test]
    fn test_sample_att_none_without_treated() {
        let data = DidDataset {
            world: "t".into(),
            units: vec![did_unit(90.0, false, 1.0, 2.0)],
        };
        assert_eq!(data.sample_att(), None);
    }

    #[test]
    fn test_compliance_shares() {
        let unit = |c| IvUnit {
            instrument: false,
            compliance: c,
            treatment: false,
            y0: 0.0,
            y1: 0.0,
            observed_outcome: 0.0,
        };
        let data = IvDataset {
            world: "t".into(),
            units: vec![
                unit(ComplianceType::Complier),
                unit(ComplianceType::NeverTaker),
                unit(ComplianceType::NeverTaker),
                unit(ComplianceType::AlwaysTaker),
            ],
        };
        let shares = data.compliance_shares();
        assert_eq!(shares.complier, 0.25);
        assert_eq!(shares.always_taker, 0.25);
        assert_eq!(shares.never_taker, 0.5);
        assert!(!data.is_empty());
    }
}
