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
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelPurchaseOrderCommand {
    pub id: Uuid,
}

#[async_trait::async_trait]
impl Command for CancelPurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let id = self.id;
        let (order, events) = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = load_order(txn, id).await?;
                lifecycle::ensure_pending(&current, "cancel")?;
                let changes = UpdatePurchaseOrderRequest {
                    status: Some(PurchaseOrderStatus::Cancelled),
                    ..Default::default()
                };
                apply_update(txn, current, &changes).await
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("cancel_purchase_order");
            e
        })?;

        count_transition(&events);
        for event in events {
            event_sender.send_or_log(event).await;
        }
        info!(purchase_order_id = %order.id, "purchase order cancelled");
        Ok(order)
    }
}
