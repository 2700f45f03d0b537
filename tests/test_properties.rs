//! Property-based tests for generators, estimators and configuration checks.

use proptest::prelude::*;

use causal_lab::estimation::{AsTreated, DidRegression, DidTwoByTwo, Tsls};
use causal_lab::generators::{generate_did, generate_iv};
use causal_lab::random::RandomStream;
use causal_lab::scenario::{DidScenario, IvScenario};
use causal_lab::simulation::EstimateStats;
use causal_lab::{EffectEstimator, EstimationResult};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 * (1.0 + a.abs().max(b.abs()))
}

fn same_estimate(a: &EstimationResult, b: &EstimationResult) -> bool {
    close(a.estimate, b.estimate) && close(a.std_error, b.std_error) && a.degenerate == b.degenerate
}

/// Rotate by `shift` and then reverse: a permutation that moves every unit.
fn permute<T: Clone>(units: &[T], shift: usize) -> Vec<T> {
    let mut out = units.to_vec();
    out.rotate_left(shift % units.len());
    out.reverse();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // 1. Generation is a pure function of the seed
    #[test]
    fn iv_generation_deterministic(seed in any::<u64>(), n in 1usize..200) {
        let scenario = IvScenario::world_b().with_sample_size(n);
        let a = generate_iv(&scenario, &mut RandomStream::from_seed(seed)).unwrap();
        let b = generate_iv(&scenario, &mut RandomStream::from_seed(seed)).unwrap();
        prop_assert_eq!(a, b);
    }

    // 2. Assignment is exactly the threshold rule, whatever the threshold
    #[test]
    fn did_assignment_is_threshold_rule(seed in any::<u64>(), threshold in 60.0f64..140.0) {
        let mut scenario = DidScenario::diverging_trends().with_sample_size(150);
        scenario.threshold = threshold;
        let data = generate_did(&scenario, &mut RandomStream::from_seed(seed)).unwrap();
        for u in &data.units {
            prop_assert_eq!(u.assignment, u.pre_outcome >= threshold);
            let realized = if u.assignment { u.y1 } else { u.y0 };
            prop_assert_eq!(u.observed_outcome.to_bits(), realized.to_bits());
        }
    }

    // 3. Unit order does not matter to any estimator
    #[test]
    fn iv_estimates_order_invariant(seed in any::<u64>(), shift in 0usize..400) {
        let scenario = IvScenario::world_a().with_sample_size(400);
        let data = generate_iv(&scenario, &mut RandomStream::from_seed(seed)).unwrap();
        let mut shuffled = data.clone();
        shuffled.units = permute(&data.units, shift);

        let tsls = Tsls::default();
        prop_assert!(same_estimate(&tsls.estimate(&data), &tsls.estimate(&shuffled)));
        let naive = AsTreated::default();
        prop_assert!(same_estimate(&naive.estimate(&data), &naive.estimate(&shuffled)));
    }

    #[test]
    fn did_estimates_order_invariant(seed in any::<u64>(), shift in 0usize..400) {
        let scenario = DidScenario::parallel_trends().with_sample_size(400);
        let data = generate_did(&scenario, &mut RandomStream::from_seed(seed)).unwrap();
        let mut shuffled = data.clone();
        shuffled.units = permute(&data.units, shift);

        let reg = DidRegression::default();
        prop_assert!(same_estimate(&reg.estimate(&data), &reg.estimate(&shuffled)));
        prop_assert!(same_estimate(&DidTwoByTwo.estimate(&data), &DidTwoByTwo.estimate(&shuffled)));
    }

    // 4. Compliance shares off the simplex are rejected
    #[test]
    fn shares_must_sum_to_one(a in 0.0f64..1.0, b in 0.0f64..1.0, c in 0.0f64..1.0) {
        prop_assume!((a + b + c - 1.0).abs() > 1e-6);
        let mut scenario = IvScenario::world_a();
        scenario.compliance.complier.share = a;
        scenario.compliance.always_taker.share = b;
        scenario.compliance.never_taker.share = c;
        prop_assert!(scenario.validate().is_err());
    }

    // 5. Non-positive standard deviations are rejected
    #[test]
    fn non_positive_sd_rejected(sd in -50.0f64..=0.0) {
        let mut iv = IvScenario::world_c();
        iv.residual_sd = sd;
        prop_assert!(iv.validate().is_err());

        let mut did = DidScenario::parallel_trends();
        did.outcome_sd = sd;
        prop_assert!(did.validate().is_err());
    }

    // 6. Splitting the reduction anywhere gives the same moments
    #[test]
    fn stats_merge_split_invariant(
        values in prop::collection::vec(-100.0f64..100.0, 2..64),
        split in 0usize..64,
    ) {
        let split = split % values.len();
        let as_result = |v: f64| {
            EstimationResult::from_coefficient(
                "w",
                causal_lab::Method::AsTreated,
                10,
                causal_lab::estimation::Coefficient { estimate: v, std_error: 1.0, df: 8 },
                false,
            )
        };
        let fold = |vs: &[f64]| {
            let mut s = EstimateStats::new();
            for &v in vs {
                s.push(&as_result(v), 0.0, 0.95);
            }
            s
        };
        let whole = fold(&values);
        let mut merged = fold(&values[..split]);
        merged.merge(&fold(&values[split..]));
        prop_assert_eq!(merged.count(), whole.count());
        prop_assert!((merged.mean() - whole.mean()).abs() < 1e-9);
        prop_assert!((merged.variance_sample() - whole.variance_sample()).abs() < 1e-7);
    }
}
