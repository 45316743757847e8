use super::{
    lifecycle,
    load_order,
    update_purchase_order_command::{apply_update, count_transition, UpdatePurchaseOrderRequest},
};
use crate::{
    commands::Command,
    db::{self, DbPool},
    entities::purchase_order::{self, PurchaseOrderStatus},
    errors::ServiceError,
    events::EventSender,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /purchase-orders/{id}/complete`; both fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CompletePurchaseOrderRequest {
    /// Defaults to the completion time
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub actual_delivery_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1.0, max = 5.0, message = "quality_rating must be between 1 and 5"))]
    pub quality_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletePurchaseOrderCommand {
    pub id: Uuid,
    pub request: CompletePurchaseOrderRequest,
}

#[async_trait::async_trait]
impl Command for CompletePurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.request.validate()?;

        let id = self.id;
        let changes = UpdatePurchaseOrderRequest {
            status: Some(PurchaseOrderStatus::Completed),
            actual_delivery_date: self.request.actual_delivery_date,
            quality_rating: self.request.quality_rating,
            ..Default::default()
        };
        let (order, events) = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = load_order(txn, id).await?;
                lifecycle::ensure_pending(&current, "complete")?;
                apply_update(txn, current, &changes).await
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("complete_purchase_order");
            e
        })?;

        count_transition(&events);
        for event in events {
            event_sender.send_or_log(event).await;
        }
        info!(purchase_order_id = %order.id, "purchase order completed");
        Ok(order)
    }
}
