//! Vendor performance metrics.
//!
//! Every metric is a pure function of a vendor's purchase orders, so a
//! recompute over an unchanged order set always yields the same values.

use crate::entities::purchase_order::{self, PurchaseOrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The subset of a purchase order the metrics depend on.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderFacts {
    pub status: PurchaseOrderStatus,
    pub expected_delivery_date: DateTime<Utc>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub quality_rating: Option<f64>,
    pub issue_date: DateTime<Utc>,
    pub acknowledgment_date: Option<DateTime<Utc>>,
}

impl From<&purchase_order::Model> for OrderFacts {
    fn from(order: &purchase_order::Model) -> Self {
        Self {
            status: order.status,
            expected_delivery_date: order.expected_delivery_date,
            actual_delivery_date: order.actual_delivery_date,
            quality_rating: order.quality_rating,
            issue_date: order.issue_date,
            acknowledgment_date: order.acknowledgment_date,
        }
    }
}

impl OrderFacts {
    fn is_completed(&self) -> bool {
        self.status == PurchaseOrderStatus::Completed
    }

    /// A completed order with no recorded delivery counts as late.
    fn delivered_on_time(&self) -> bool {
        self.actual_delivery_date
            .map(|actual| actual <= self.expected_delivery_date)
            .unwrap_or(false)
    }

    fn response_seconds(&self) -> Option<f64> {
        self.acknowledgment_date
            .map(|ack| (ack - self.issue_date).num_milliseconds() as f64 / 1000.0)
    }
}

/// The four derived metrics stored on a vendor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceMetrics {
    /// Share of completed orders delivered by their expected date, in [0, 1]
    pub on_time_delivery_rate: f64,
    /// Mean quality rating of graded completed orders; 0 when none are graded
    pub quality_rating_average: f64,
    /// Mean seconds between issue and acknowledgment over completed orders
    pub average_response_time: f64,
    /// Completed orders over all orders (cancelled included), in [0, 1]
    pub fulfilment_rate: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Computes all four metrics from a vendor's complete order set.
pub fn compute(orders: &[OrderFacts]) -> PerformanceMetrics {
    let completed: Vec<&OrderFacts> = orders.iter().filter(|o| o.is_completed()).collect();
    let on_time = completed.iter().filter(|o| o.delivered_on_time()).count();

    PerformanceMetrics {
        on_time_delivery_rate: ratio(on_time, completed.len()),
        quality_rating_average: mean(completed.iter().filter_map(|o| o.quality_rating)),
        average_response_time: mean(completed.iter().filter_map(|o| o.response_seconds())),
        fulfilment_rate: ratio(completed.len(), orders.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn order(status: PurchaseOrderStatus) -> OrderFacts {
        OrderFacts {
            status,
            expected_delivery_date: base() + Duration::days(7),
            actual_delivery_date: None,
            quality_rating: None,
            issue_date: base(),
            acknowledgment_date: None,
        }
    }

    fn completed(delivered_after_days: i64, rating: Option<f64>) -> OrderFacts {
        OrderFacts {
            actual_delivery_date: Some(base() + Duration::days(delivered_after_days)),
            quality_rating: rating,
            ..order(PurchaseOrderStatus::Completed)
        }
    }

    #[test]
    fn empty_order_set_yields_zeroes() {
        assert_eq!(compute(&[]), PerformanceMetrics::default());
    }

    #[test]
    fn pending_and_cancelled_only_yields_zeroes() {
        let orders = vec![
            order(PurchaseOrderStatus::Pending),
            order(PurchaseOrderStatus::Cancelled),
        ];
        assert_eq!(compute(&orders), PerformanceMetrics::default());
    }

    #[test]
    fn one_on_time_and_one_late_is_half() {
        let orders = vec![completed(5, None), completed(9, None)];
        assert_eq!(compute(&orders).on_time_delivery_rate, 0.5);
    }

    #[test]
    fn delivery_exactly_on_expected_date_is_on_time() {
        let orders = vec![completed(7, None)];
        assert_eq!(compute(&orders).on_time_delivery_rate, 1.0);
    }

    #[test]
    fn completed_without_delivery_date_counts_late() {
        let orders = vec![order(PurchaseOrderStatus::Completed), completed(1, None)];
        assert_eq!(compute(&orders).on_time_delivery_rate, 0.5);
    }

    #[test]
    fn quality_average_ignores_ungraded_and_non_completed() {
        let mut pending = order(PurchaseOrderStatus::Pending);
        pending.quality_rating = Some(1.0);
        let orders = vec![completed(1, Some(4.0)), completed(1, Some(5.0)), completed(1, None), pending];
        assert_eq!(compute(&orders).quality_rating_average, 4.5);
    }

    #[test]
    fn response_time_averages_seconds_over_completed_acknowledged() {
        let mut a = completed(1, None);
        a.acknowledgment_date = Some(base() + Duration::hours(1));
        let mut b = completed(1, None);
        b.acknowledgment_date = Some(base() + Duration::hours(3));
        let mut pending_acked = order(PurchaseOrderStatus::Pending);
        pending_acked.acknowledgment_date = Some(base() + Duration::days(10));

        let metrics = compute(&[a, b, pending_acked, completed(2, None)]);
        assert_eq!(metrics.average_response_time, 7200.0);
    }

    #[rstest]
    #[case(vec![PurchaseOrderStatus::Completed], 1.0)]
    #[case(vec![PurchaseOrderStatus::Completed, PurchaseOrderStatus::Cancelled], 0.5)]
    #[case(vec![PurchaseOrderStatus::Completed, PurchaseOrderStatus::Pending, PurchaseOrderStatus::Cancelled, PurchaseOrderStatus::Pending], 0.25)]
    #[case(vec![PurchaseOrderStatus::Cancelled], 0.0)]
    fn fulfilment_counts_every_order_in_denominator(
        #[case] statuses: Vec<PurchaseOrderStatus>,
        #[case] expected: f64,
    ) {
        let orders: Vec<OrderFacts> = statuses.into_iter().map(order).collect();
        assert_eq!(compute(&orders).fulfilment_rate, expected);
    }

    #[test]
    fn recompute_is_idempotent() {
        let orders = vec![completed(3, Some(3.0)), completed(12, Some(2.0)), order(PurchaseOrderStatus::Pending)];
        assert_eq!(compute(&orders), compute(&orders));
    }
}
