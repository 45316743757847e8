use super::{ensure_po_number_free, lifecycle::validate_items};
use crate::{
    common::not_blank,
    commands::{performance::recompute_vendor_metrics, Command},
    db::{self, DbPool},
    entities::{
        purchase_order::{self, OrderItem, OrderItems, PurchaseOrderStatus},
        vendor,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates a purchase order in `pending`. Status, rating, delivery and
/// acknowledgment fields are not accepted here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePurchaseOrderCommand {
    #[validate(length(max = 100, message = "po_number must be at most 100 characters"), custom = "not_blank")]
    pub po_number: String,
    pub vendor_id: Uuid,
    /// Defaults to now
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::common::flexible_datetime::deserialize")]
    pub expected_delivery_date: DateTime<Utc>,
    #[validate(custom = "validate_items")]
    pub items: Vec<OrderItem>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    /// Defaults to now
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub issue_date: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
impl Command for CreatePurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(po_number = %self.po_number, vendor_id = %self.vendor_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let command = self.clone();
        let (order, outcome) = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                vendor::Entity::find_by_id(command.vendor_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Vendor {} not found", command.vendor_id))
                    })?;

                let po_number = command.po_number.trim().to_string();
                ensure_po_number_free(txn, &po_number).await?;

                let now = Utc::now();
                let order = purchase_order::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    po_number: Set(po_number),
                    vendor_id: Set(command.vendor_id),
                    order_date: Set(command.order_date.unwrap_or(now)),
                    expected_delivery_date: Set(command.expected_delivery_date),
                    actual_delivery_date: Set(None),
                    items: Set(OrderItems(command.items)),
                    quantity: Set(command.quantity),
                    status: Set(PurchaseOrderStatus::Pending),
                    quality_rating: Set(None),
                    issue_date: Set(command.issue_date.unwrap_or(now)),
                    acknowledgment_date: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;

                let outcome = recompute_vendor_metrics(txn, order.vendor_id, now).await?;
                Ok((order, outcome))
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("create_purchase_order");
            error!(error = %e, "failed to create purchase order");
            e
        })?;

        crate::metrics::PURCHASE_ORDERS_CREATED.inc();
        event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                purchase_order_id: order.id,
                vendor_id: order.vendor_id,
            })
            .await;
        event_sender.send_or_log(outcome.event()).await;
        info!(purchase_order_id = %order.id, "purchase order created");
        Ok(order)
    }
}
