//! Property-based tests for the vendor performance calculations.
//!
//! Metrics are derived purely from an order set, so these check bounds and
//! stability across arbitrary mixes of pending, completed and cancelled orders.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use vendor_api::entities::purchase_order::PurchaseOrderStatus;
use vendor_api::performance::{compute, OrderFacts};

fn status_strategy() -> impl Strategy<Value = PurchaseOrderStatus> {
    prop_oneof![
        Just(PurchaseOrderStatus::Pending),
        Just(PurchaseOrderStatus::Completed),
        Just(PurchaseOrderStatus::Cancelled),
    ]
}

fn order_strategy() -> impl Strategy<Value = OrderFacts> {
    (
        status_strategy(),
        0i64..60,
        prop::option::of(0i64..90),
        prop::option::of(1.0f64..=5.0),
        prop::option::of(0i64..500_000),
    )
        .prop_map(|(status, expected_in, delivered_in, rating, ack_after)| {
            let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            OrderFacts {
                status,
                expected_delivery_date: issued + Duration::days(expected_in),
                actual_delivery_date: delivered_in.map(|d| issued + Duration::days(d)),
                quality_rating: rating,
                issue_date: issued,
                acknowledgment_date: ack_after.map(|s| issued + Duration::seconds(s)),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn rates_stay_within_unit_interval(orders in prop::collection::vec(order_strategy(), 0..40)) {
        let metrics = compute(&orders);
        prop_assert!((0.0..=1.0).contains(&metrics.on_time_delivery_rate));
        prop_assert!((0.0..=1.0).contains(&metrics.fulfilment_rate));
    }

    #[test]
    fn quality_is_zero_or_a_valid_rating(orders in prop::collection::vec(order_strategy(), 0..40)) {
        let q = compute(&orders).quality_rating_average;
        prop_assert!(q == 0.0 || (1.0 - 1e-9..=5.0 + 1e-9).contains(&q), "quality average {}", q);
    }

    #[test]
    fn response_time_is_never_negative(orders in prop::collection::vec(order_strategy(), 0..40)) {
        prop_assert!(compute(&orders).average_response_time >= 0.0);
    }

    #[test]
    fn compute_is_idempotent_and_order_independent(
        orders in prop::collection::vec(order_strategy(), 0..40)
    ) {
        let first = compute(&orders);
        prop_assert_eq!(first, compute(&orders));

        let mut reversed = orders.clone();
        reversed.reverse();
        let again = compute(&reversed);
        prop_assert!((first.on_time_delivery_rate - again.on_time_delivery_rate).abs() < 1e-9);
        prop_assert!((first.fulfilment_rate - again.fulfilment_rate).abs() < 1e-9);
        prop_assert!((first.quality_rating_average - again.quality_rating_average).abs() < 1e-9);
        prop_assert!((first.average_response_time - again.average_response_time).abs() < 1e-6);
    }

    #[test]
    fn only_completed_orders_drive_fulfilment(orders in prop::collection::vec(order_strategy(), 1..40)) {
        let completed = orders
            .iter()
            .filter(|o| o.status == PurchaseOrderStatus::Completed)
            .count();
        let expected = completed as f64 / orders.len() as f64;
        prop_assert!((compute(&orders).fulfilment_rate - expected).abs() < 1e-12);
    }
}
