use super::{ensure_po_number_free, lifecycle, lifecycle::validate_items, load_order, store_and_recompute};
use crate::{
    common::not_blank,
    commands::Command,
    db::{self, DbPool},
    entities::purchase_order::{self, OrderItem, PurchaseOrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Partial update of a purchase order, status and rating included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePurchaseOrderRequest {
    #[validate(length(max = 100, message = "po_number must be at most 100 characters"), custom = "not_blank")]
    pub po_number: Option<String>,
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub expected_delivery_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub actual_delivery_date: Option<DateTime<Utc>>,
    #[validate(custom = "validate_items")]
    pub items: Option<Vec<OrderItem>>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
    pub status: Option<PurchaseOrderStatus>,
    #[validate(range(min = 1.0, max = 5.0, message = "quality_rating must be between 1 and 5"))]
    pub quality_rating: Option<f64>,
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::common::flexible_datetime_opt::deserialize")]
    pub acknowledgment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePurchaseOrderCommand {
    pub id: Uuid,
    pub changes: UpdatePurchaseOrderRequest,
}

/// Plans and persists an update inside `txn`, returning the order, any status
/// change and the recompute that followed. `None` means nothing changed.
pub(crate) async fn apply_update(
    txn: &sea_orm::DatabaseTransaction,
    current: purchase_order::Model,
    changes: &UpdatePurchaseOrderRequest,
) -> Result<(purchase_order::Model, Vec<Event>), ServiceError> {
    let now = Utc::now();
    let plan = match lifecycle::plan_update(&current, changes, now)? {
        Some(plan) => plan,
        None => return Ok((current, Vec::new())),
    };

    if plan.order.po_number != current.po_number {
        ensure_po_number_free(txn, &plan.order.po_number).await?;
    }

    let (saved, outcome) = store_and_recompute(txn, plan.order, now).await?;
    let mut events = vec![Event::PurchaseOrderUpdated(saved.id)];
    if let Some((old_status, new_status)) = plan.status_change {
        events.push(Event::PurchaseOrderStatusChanged {
            purchase_order_id: saved.id,
            old_status,
            new_status,
        });
    }
    events.push(outcome.event());
    Ok((saved, events))
}

pub(crate) fn count_transition(events: &[Event]) {
    for event in events {
        if let Event::PurchaseOrderStatusChanged { new_status, .. } = event {
            match new_status {
                PurchaseOrderStatus::Completed => crate::metrics::PURCHASE_ORDERS_COMPLETED.inc(),
                PurchaseOrderStatus::Cancelled => crate::metrics::PURCHASE_ORDERS_CANCELLED.inc(),
                PurchaseOrderStatus::Pending => {}
            }
        }
    }
}

#[async_trait::async_trait]
impl Command for UpdatePurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.changes.validate()?;

        let id = self.id;
        let changes = self.changes.clone();
        let (order, events) = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = load_order(txn, id).await?;
                apply_update(txn, current, &changes).await
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("update_purchase_order");
            e
        })?;

        if events.is_empty() {
            info!(purchase_order_id = %id, "purchase order update was a no-op");
            return Ok(order);
        }

        count_transition(&events);
        for event in events {
            event_sender.send_or_log(event).await;
        }
        info!(purchase_order_id = %order.id, status = %order.status, "purchase order updated");
        Ok(order)
    }
}
