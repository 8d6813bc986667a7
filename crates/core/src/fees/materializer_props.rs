//! Property-based tests for FeeMaterializer.

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::fees::materializer::FeeMaterializer;
use crate::fees::types::{ChargeType, FeeAttribute};

/// Strategy for positive principals between 0.01 and 10,000,000.00.
fn arb_principal() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for fee attributes with up to four decimal places.
fn arb_attribute() -> impl Strategy<Value = FeeAttribute> {
    (
        "[A-Z][a-z]{2,10}",
        0i64..5_000_000i64,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(name, raw, is_percentage, recurring)| {
            let value = Decimal::new(raw, 4);
            if recurring {
                FeeAttribute::recurring_monthly(name, value, is_percentage)
            } else {
                FeeAttribute::one_time(name, value, is_percentage)
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every percentage fee equals principal * value / 100 rounded half-up to
    /// two places, and every fixed fee equals its template value.
    #[test]
    fn prop_fee_amount_resolution(
        principal in arb_principal(),
        catalog in prop::collection::vec(arb_attribute(), 0..8)
    ) {
        let fees = FeeMaterializer::materialize(&catalog, principal).unwrap();
        prop_assert_eq!(fees.len(), catalog.len());

        for (fee, attribute) in fees.iter().zip(&catalog) {
            prop_assert_eq!(&fee.name, &attribute.name);
            prop_assert_eq!(fee.original_value, attribute.value);
            prop_assert_eq!(fee.is_percentage, attribute.is_percentage);
            if attribute.is_percentage {
                let expected = (principal * attribute.value / Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                prop_assert_eq!(fee.amount, expected);
            } else {
                prop_assert_eq!(fee.amount, attribute.value);
            }
        }
    }

    /// The payable total is the principal plus one-time fees only.
    #[test]
    fn prop_total_payable(
        principal in arb_principal(),
        catalog in prop::collection::vec(arb_attribute(), 0..8)
    ) {
        let fees = FeeMaterializer::materialize(&catalog, principal).unwrap();
        let one_time: Decimal = fees
            .iter()
            .filter(|fee| fee.charge_type == ChargeType::OneTime)
            .map(|fee| fee.amount)
            .sum();

        prop_assert_eq!(FeeMaterializer::total_payable(principal, &fees).unwrap(), principal + one_time);
    }

    /// Non-positive principals never produce fees.
    #[test]
    fn prop_non_positive_principal_rejected(
        raw in -1_000_000i64..=0i64,
        catalog in prop::collection::vec(arb_attribute(), 0..4)
    ) {
        let principal = Decimal::new(raw, 2);
        prop_assert!(FeeMaterializer::materialize(&catalog, principal).is_err());
    }
}
