use crate::{
    commands::{
        vendors::{CreateVendorCommand, DeleteVendorCommand, UpdateVendorCommand, UpdateVendorRequest},
        Command,
    },
    db::DbPool,
    entities::vendor,
    errors::ServiceError,
    events::EventSender,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Service for managing vendors
#[derive(Clone)]
pub struct VendorService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl VendorService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new vendor
    #[instrument(skip(self))]
    pub async fn create_vendor(
        &self,
        command: CreateVendorCommand,
    ) -> Result<vendor::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Applies a partial profile update
    #[instrument(skip(self))]
    pub async fn update_vendor(
        &self,
        id: Uuid,
        changes: UpdateVendorRequest,
    ) -> Result<vendor::Model, ServiceError> {
        UpdateVendorCommand { id, changes }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Deletes a vendor with its orders and history
    #[instrument(skip(self))]
    pub async fn delete_vendor(&self, id: Uuid) -> Result<(), ServiceError> {
        DeleteVendorCommand { id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_vendor(&self, id: Uuid) -> Result<Option<vendor::Model>, ServiceError> {
        Ok(vendor::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_vendor_by_code(
        &self,
        vendor_code: &str,
    ) -> Result<Option<vendor::Model>, ServiceError> {
        Ok(vendor::Entity::find()
            .filter(vendor::Column::VendorCode.eq(vendor_code))
            .one(self.db_pool.as_ref())
            .await?)
    }

    /// Lists vendors by name; `page` is 1-based. Returns the page and the total count.
    #[instrument(skip(self))]
    pub async fn list_vendors(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<vendor::Model>, u64), ServiceError> {
        let paginator = vendor::Entity::find()
            .order_by_asc(vendor::Column::Name)
            .order_by_asc(vendor::Column::Id)
            .paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let vendors = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((vendors, total))
    }
}
