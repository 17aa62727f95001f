//! Property-based tests for the Correction Calculator.
//!
//! - Property 1: Delta Algebra
//! - Property 2: Reversibility

use bolsa_shared::{Money, TariffConfig};
use proptest::prelude::*;

use super::calculator::CorrectionCalculator;
use crate::tariff::{TariffResolver, Tier};

fn tier_strategy() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::LowDisplacement), Just(Tier::MidDisplacement)]
}

fn config_strategy() -> impl Strategy<Value = TariffConfig> {
    (1i64..5_000_000i64, 1i64..5_000_000i64, 0i64..500_000i64).prop_map(|(low, mid, commission)| {
        TariffConfig {
            low_displacement_base: low,
            mid_displacement_base: mid,
            commission,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property 1: prior total plus delta is always the new tariff total, and
    /// the balance adjustment is its exact negation.
    #[test]
    fn prop_delta_algebra(
        config in config_strategy(),
        prior in 1i64..10_000_000i64,
        tier in tier_strategy(),
    ) {
        let resolver = TariffResolver::from_config(&config).unwrap();
        let plan = CorrectionCalculator::new(&resolver).plan(Money::new(prior), tier).unwrap();

        prop_assert_eq!(
            Money::new(prior).checked_add(plan.delta).unwrap(),
            resolver.resolve(tier).unwrap().total()
        );
        prop_assert_eq!(plan.balance_adjustment().unwrap().checked_add(plan.delta).unwrap(), Money::ZERO);
        prop_assert_eq!(plan.is_noop(), plan.delta.is_zero());
    }

    /// Property 2: correcting A -> B and then B -> A nets to zero.
    #[test]
    fn prop_round_trip_nets_to_zero(
        config in config_strategy(),
        from in tier_strategy(),
        to in tier_strategy(),
    ) {
        let resolver = TariffResolver::from_config(&config).unwrap();
        let calculator = CorrectionCalculator::new(&resolver);

        let issued = resolver.resolve(from).unwrap().total();
        let forward = calculator.plan(issued, to).unwrap();
        let back = calculator.plan(forward.new_tariff.total(), from).unwrap();

        prop_assert_eq!(forward.delta.checked_add(back.delta).unwrap(), Money::ZERO);
        if from == to {
            prop_assert!(forward.is_noop());
        }
    }
}
