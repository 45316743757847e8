use crate::{
    commands::Command,
    db::{self, DbPool},
    entities::{historical_performance, purchase_order, vendor},
    errors::ServiceError,
    events::{Event, EventSender},
    performance::{self, OrderFacts, PerformanceMetrics},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Result of a recompute: the refreshed vendor row and the snapshot appended
/// to its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeOutcome {
    pub vendor: vendor::Model,
    pub snapshot: historical_performance::Model,
}

impl RecomputeOutcome {
    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            on_time_delivery_rate: self.vendor.on_time_delivery_rate,
            quality_rating_average: self.vendor.quality_rating_average,
            average_response_time: self.vendor.average_response_time,
            fulfilment_rate: self.vendor.fulfilment_rate,
        }
    }

    pub fn event(&self) -> Event {
        Event::VendorMetricsRecomputed {
            vendor_id: self.vendor.id,
            metrics_version: self.vendor.metrics_version,
            metrics: self.metrics(),
        }
    }
}

/// Recomputes a vendor's metrics from its current order set, stores them on
/// the vendor row and appends a history snapshot.
///
/// Runs on whatever connection it is given; callers pass their open
/// transaction so the order write and the metrics commit together.
pub async fn recompute_vendor_metrics<C>(
    conn: &C,
    vendor_id: Uuid,
    now: DateTime<Utc>,
) -> Result<RecomputeOutcome, ServiceError>
where
    C: ConnectionTrait,
{
    let current = vendor::Entity::find_by_id(vendor_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", vendor_id)))?;

    let orders = purchase_order::Entity::find()
        .filter(purchase_order::Column::VendorId.eq(vendor_id))
        .all(conn)
        .await?;
    let facts: Vec<OrderFacts> = orders.iter().map(OrderFacts::from).collect();
    let metrics = performance::compute(&facts);
    let version = current.metrics_version + 1;

    debug!(
        %vendor_id,
        orders = orders.len(),
        version,
        "recomputing vendor metrics"
    );

    let mut active: vendor::ActiveModel = current.into();
    active.on_time_delivery_rate = Set(metrics.on_time_delivery_rate);
    active.quality_rating_average = Set(metrics.quality_rating_average);
    active.average_response_time = Set(metrics.average_response_time);
    active.fulfilment_rate = Set(metrics.fulfilment_rate);
    active.metrics_version = Set(version);
    active.metrics_updated_at = Set(Some(now));
    let vendor = active.update(conn).await?;

    let snapshot = historical_performance::ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        recorded_at: Set(now),
        on_time_delivery_rate: Set(metrics.on_time_delivery_rate),
        quality_rating_average: Set(metrics.quality_rating_average),
        average_response_time: Set(metrics.average_response_time),
        fulfilment_rate: Set(metrics.fulfilment_rate),
        metrics_version: Set(version),
    }
    .insert(conn)
    .await?;

    crate::metrics::METRIC_RECOMPUTES.inc();
    Ok(RecomputeOutcome { vendor, snapshot })
}

/// Operator-triggered recompute of one vendor's metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeVendorMetricsCommand {
    pub vendor_id: Uuid,
}

#[async_trait::async_trait]
impl Command for RecomputeVendorMetricsCommand {
    type Result = RecomputeOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(vendor_id = %self.vendor_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let vendor_id = self.vendor_id;
        let outcome = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move { recompute_vendor_metrics(txn, vendor_id, Utc::now()).await })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("recompute_vendor_metrics");
            e
        })?;

        event_sender.send_or_log(outcome.event()).await;
        Ok(outcome)
    }
}
