use crate::{
    commands::Command,
    db::{self, DbPool},
    entities::{historical_performance, purchase_order, vendor},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Deletes a vendor together with its purchase orders and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteVendorCommand {
    pub id: Uuid,
}

#[async_trait::async_trait]
impl Command for DeleteVendorCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(vendor_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let id = self.id;
        let removed_orders = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = vendor::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", id)))?;

                historical_performance::Entity::delete_many()
                    .filter(historical_performance::Column::VendorId.eq(id))
                    .exec(txn)
                    .await?;
                let orders = purchase_order::Entity::delete_many()
                    .filter(purchase_order::Column::VendorId.eq(id))
                    .exec(txn)
                    .await?;
                current.delete(txn).await?;
                Ok(orders.rows_affected)
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("delete_vendor");
            e
        })?;

        crate::metrics::VENDORS_DELETED.inc();
        event_sender.send_or_log(Event::VendorDeleted(id)).await;
        info!(vendor_id = %id, removed_orders, "vendor deleted");
        Ok(())
    }
}
