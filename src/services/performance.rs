use crate::{
    commands::{
        performance::{RecomputeOutcome, RecomputeVendorMetricsCommand},
        Command,
    },
    db::DbPool,
    entities::{historical_performance, vendor},
    errors::ServiceError,
    events::EventSender,
    performance::PerformanceMetrics,
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// A vendor's current materialized metrics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VendorPerformance {
    pub vendor_id: Uuid,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    /// Incremented on every recompute; 0 until the first one
    pub metrics_version: i32,
    pub metrics_updated_at: Option<DateTime<Utc>>,
}

impl From<&vendor::Model> for VendorPerformance {
    fn from(vendor: &vendor::Model) -> Self {
        Self {
            vendor_id: vendor.id,
            metrics: PerformanceMetrics {
                on_time_delivery_rate: vendor.on_time_delivery_rate,
                quality_rating_average: vendor.quality_rating_average,
                average_response_time: vendor.average_response_time,
                fulfilment_rate: vendor.fulfilment_rate,
            },
            metrics_version: vendor.metrics_version,
            metrics_updated_at: vendor.metrics_updated_at,
        }
    }
}

/// Reads and refreshes vendor performance metrics.
#[derive(Clone)]
pub struct PerformanceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PerformanceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn require_vendor(&self, vendor_id: Uuid) -> Result<vendor::Model, ServiceError> {
        vendor::Entity::find_by_id(vendor_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", vendor_id)))
    }

    #[instrument(skip(self))]
    pub async fn current(&self, vendor_id: Uuid) -> Result<VendorPerformance, ServiceError> {
        let vendor = self.require_vendor(vendor_id).await?;
        Ok(VendorPerformance::from(&vendor))
    }

    /// Snapshots for a vendor, newest first; `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        vendor_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<historical_performance::Model>, u64), ServiceError> {
        self.require_vendor(vendor_id).await?;
        let paginator = historical_performance::Entity::find()
            .filter(historical_performance::Column::VendorId.eq(vendor_id))
            .order_by_desc(historical_performance::Column::MetricsVersion)
            .paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let snapshots = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((snapshots, total))
    }

    #[instrument(skip(self))]
    pub async fn recompute(&self, vendor_id: Uuid) -> Result<RecomputeOutcome, ServiceError> {
        RecomputeVendorMetricsCommand { vendor_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }
}
