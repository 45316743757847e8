use crate::{
    commands::Command,
    common::not_blank,
    db::{self, DbPool},
    entities::vendor,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Partial update of a vendor's profile. Metric fields are not accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateVendorRequest {
    #[validate(length(max = 100, message = "name must be at most 100 characters"), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(custom = "not_blank")]
    pub contact_details: Option<String>,
    #[validate(custom = "not_blank")]
    pub address: Option<String>,
    #[validate(length(max = 50, message = "vendor_code must be at most 50 characters"), custom = "not_blank")]
    pub vendor_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVendorCommand {
    pub id: Uuid,
    pub changes: UpdateVendorRequest,
}

#[async_trait::async_trait]
impl Command for UpdateVendorCommand {
    type Result = vendor::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(vendor_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.changes.validate()?;

        let id = self.id;
        let changes = self.changes.clone();
        let updated = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = vendor::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", id)))?;

                if let Some(code) = changes.vendor_code.as_deref().map(str::trim) {
                    if code != current.vendor_code {
                        let clash = vendor::Entity::find()
                            .filter(vendor::Column::VendorCode.eq(code))
                            .one(txn)
                            .await?;
                        if clash.is_some() {
                            return Err(ServiceError::Conflict(format!(
                                "Vendor code '{}' already exists",
                                code
                            )));
                        }
                    }
                }

                let mut active: vendor::ActiveModel = current.into();
                if let Some(name) = changes.name {
                    active.name = Set(name.trim().to_string());
                }
                if let Some(contact_details) = changes.contact_details {
                    active.contact_details = Set(contact_details);
                }
                if let Some(address) = changes.address {
                    active.address = Set(address);
                }
                if let Some(code) = changes.vendor_code {
                    active.vendor_code = Set(code.trim().to_string());
                }
                active.updated_at = Set(Utc::now());
                Ok(active.update(txn).await?)
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("update_vendor");
            e
        })?;

        event_sender.send_or_log(Event::VendorUpdated(updated.id)).await;
        info!(vendor_id = %updated.id, "vendor updated");
        Ok(updated)
    }
}
