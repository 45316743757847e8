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
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Registers a vendor. Metrics start at zero and cannot be supplied.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateVendorCommand {
    #[validate(length(max = 100, message = "name must be at most 100 characters"), custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub contact_details: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(length(max = 50, message = "vendor_code must be at most 50 characters"), custom = "not_blank")]
    pub vendor_code: String,
}

#[async_trait::async_trait]
impl Command for CreateVendorCommand {
    type Result = vendor::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(vendor_code = %self.vendor_code))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let command = self.clone();
        let created = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let vendor_code = command.vendor_code.trim().to_string();
                let existing = vendor::Entity::find()
                    .filter(vendor::Column::VendorCode.eq(vendor_code.as_str()))
                    .one(txn)
                    .await?;
                if existing.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Vendor code '{}' already exists",
                        vendor_code
                    )));
                }

                let now = Utc::now();
                let model = vendor::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    vendor_code: Set(vendor_code),
                    name: Set(command.name.trim().to_string()),
                    contact_details: Set(command.contact_details),
                    address: Set(command.address),
                    on_time_delivery_rate: Set(0.0),
                    quality_rating_average: Set(0.0),
                    average_response_time: Set(0.0),
                    fulfilment_rate: Set(0.0),
                    metrics_version: Set(0),
                    metrics_updated_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                Ok(model.insert(txn).await?)
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("create_vendor");
            error!(error = %e, "failed to create vendor");
            e
        })?;

        crate::metrics::VENDORS_CREATED.inc();
        event_sender
            .send_or_log(Event::VendorCreated(created.id))
            .await;
        info!(vendor_id = %created.id, "vendor created");
        Ok(created)
    }
}
