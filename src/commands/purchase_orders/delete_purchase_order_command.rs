use super::load_order;
use crate::{
    commands::{performance::recompute_vendor_metrics, Command},
    db::{self, DbPool},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::ModelTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Deletes a purchase order and recomputes its vendor's metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePurchaseOrderCommand {
    pub id: Uuid,
}

#[async_trait::async_trait]
impl Command for DeletePurchaseOrderCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let id = self.id;
        let (vendor_id, outcome) = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = load_order(txn, id).await?;
                let vendor_id = current.vendor_id;
                current.delete(txn).await?;
                let outcome = recompute_vendor_metrics(txn, vendor_id, Utc::now()).await?;
                Ok((vendor_id, outcome))
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("delete_purchase_order");
            e
        })?;

        event_sender
            .send_or_log(Event::PurchaseOrderDeleted {
                purchase_order_id: id,
                vendor_id,
            })
            .await;
        event_sender.send_or_log(outcome.event()).await;
        info!(purchase_order_id = %id, %vendor_id, "purchase order deleted");
        Ok(())
    }
}
