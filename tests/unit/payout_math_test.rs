// Property-based checks of the financial identities every generated invoice
// must satisfy:
//   platform_fee_amount == round_half_up(gross * fee% / 100)
//   net_amount == max(0, gross - fee + adjustments), clamp flagged
//   sum(order_summary amounts) == gross, to the cent

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

use payrun::modules::payouts::models::PayoutAggregate;

#[path = "../helpers/fixtures.rs"]
#[allow(dead_code)]
mod fixtures;

use fixtures::{mid_window, organization, paid_order, refund_event};

fn build_aggregate(
    order_cents: &[i64],
    fee_percent: u8,
    refund_cents: Option<i64>,
) -> PayoutAggregate {
    let org = organization("org-1", Decimal::from(fee_percent));
    let period = fixtures::last_week();

    let orders: Vec<_> = order_cents
        .iter()
        .enumerate()
        .map(|(i, cents)| {
            paid_order(
                &format!("o-{}", i),
                "org-1",
                mid_window(),
                Decimal::new(*cents, 2),
            )
        })
        .collect();

    let events = refund_cents
        .map(|cents| vec![refund_event("o-0", Decimal::new(cents, 2), "item returned")])
        .unwrap_or_default();

    PayoutAggregate::build(&org, period, &orders, &events)
        .unwrap()
        .expect("at least one order was supplied")
}

proptest! {
    #[test]
    fn test_fee_identity(
        order_cents in prop::collection::vec(1i64..10_000_000i64, 1..5),
        fee_percent in 0u8..=100u8,
    ) {
        let aggregate = build_aggregate(&order_cents, fee_percent, None);

        let expected_fee = (aggregate.gross_amount * Decimal::from(fee_percent)
            / Decimal::from(100))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        prop_assert_eq!(aggregate.platform_fee_amount, expected_fee);
        prop_assert!(aggregate.platform_fee_amount <= aggregate.gross_amount);
        prop_assert!(aggregate.platform_fee_amount >= Decimal::ZERO);
    }

    #[test]
    fn test_net_identity_and_clamping(
        order_cents in prop::collection::vec(1i64..10_000_000i64, 1..5),
        fee_percent in 0u8..=100u8,
        refund_cents in 0i64..20_000_000i64,
    ) {
        let aggregate = build_aggregate(&order_cents, fee_percent, Some(refund_cents));

        let raw_net = aggregate.gross_amount - aggregate.platform_fee_amount
            + aggregate.total_adjustment_amount;

        if raw_net < Decimal::ZERO {
            prop_assert!(aggregate.net_clamped, "negative raw net must be flagged");
            prop_assert_eq!(aggregate.net_amount, Decimal::ZERO);
        } else {
            prop_assert!(!aggregate.net_clamped);
            prop_assert_eq!(aggregate.net_amount, raw_net);
        }

        prop_assert!(aggregate.net_amount >= Decimal::ZERO);
        prop_assert_eq!(aggregate.total_adjustment_amount, Decimal::new(-refund_cents, 2));
    }

    #[test]
    fn test_gross_equals_order_summary_sum(
        order_cents in prop::collection::vec(1i64..10_000_000i64, 1..6),
        fee_percent in 0u8..=100u8,
    ) {
        let aggregate = build_aggregate(&order_cents, fee_percent, None);

        let summary_total: Decimal = aggregate
            .order_summary
            .iter()
            .map(|snapshot| snapshot.total_amount)
            .sum();

        prop_assert_eq!(summary_total, aggregate.gross_amount);
        prop_assert_eq!(aggregate.order_count as usize, order_cents.len());
        prop_assert!(aggregate.gross_amount >= Decimal::ZERO);
    }

    #[test]
    fn test_aggregation_is_deterministic(
        order_cents in prop::collection::vec(1i64..10_000_000i64, 1..5),
        fee_percent in 0u8..=100u8,
        refund_cents in 0i64..5_000_000i64,
    ) {
        let first = build_aggregate(&order_cents, fee_percent, Some(refund_cents));
        let second = build_aggregate(&order_cents, fee_percent, Some(refund_cents));

        prop_assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}

#[test]
fn test_midpoint_fee_rounds_up() {
    // gross 33.50 at 15% = 5.025 -> 5.03 under round-half-up
    let aggregate = build_aggregate(&[3350], 15, None);

    assert_eq!(aggregate.platform_fee_amount, Decimal::new(503, 2));
}

#[test]
fn test_hundred_percent_fee_consumes_gross() {
    let aggregate = build_aggregate(&[10_000], 100, None);

    assert_eq!(aggregate.platform_fee_amount, aggregate.gross_amount);
    assert_eq!(aggregate.net_amount, Decimal::ZERO);
    assert!(!aggregate.net_clamped);
}
