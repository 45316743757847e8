use crate::{
    commands::{
        purchase_orders::{
            AcknowledgeOutcome, AcknowledgePurchaseOrderCommand, CancelPurchaseOrderCommand,
            CompletePurchaseOrderCommand, CompletePurchaseOrderRequest, CreatePurchaseOrderCommand,
            DeletePurchaseOrderCommand, UpdatePurchaseOrderCommand, UpdatePurchaseOrderRequest,
        },
        Command,
    },
    db::DbPool,
    entities::purchase_order::{self, PurchaseOrderStatus},
    errors::ServiceError,
    events::EventSender,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;
use uuid::Uuid;

/// Optional filters for listing purchase orders.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PurchaseOrderFilter {
    pub vendor_id: Option<Uuid>,
    pub status: Option<PurchaseOrderStatus>,
}

/// Service for managing purchase orders
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_purchase_order(
        &self,
        command: CreatePurchaseOrderCommand,
    ) -> Result<purchase_order::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn update_purchase_order(
        &self,
        id: Uuid,
        changes: UpdatePurchaseOrderRequest,
    ) -> Result<purchase_order::Model, ServiceError> {
        UpdatePurchaseOrderCommand { id, changes }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn complete_purchase_order(
        &self,
        id: Uuid,
        request: CompletePurchaseOrderRequest,
    ) -> Result<purchase_order::Model, ServiceError> {
        CompletePurchaseOrderCommand { id, request }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_purchase_order(
        &self,
        id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        CancelPurchaseOrderCommand { id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn acknowledge_purchase_order(
        &self,
        id: Uuid,
    ) -> Result<AcknowledgeOutcome, ServiceError> {
        AcknowledgePurchaseOrderCommand { id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, id: Uuid) -> Result<(), ServiceError> {
        DeletePurchaseOrderCommand { id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        id: Uuid,
    ) -> Result<Option<purchase_order::Model>, ServiceError> {
        Ok(purchase_order::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order_by_number(
        &self,
        po_number: &str,
    ) -> Result<Option<purchase_order::Model>, ServiceError> {
        Ok(purchase_order::Entity::find()
            .filter(purchase_order::Column::PoNumber.eq(po_number))
            .one(self.db_pool.as_ref())
            .await?)
    }

    /// Lists purchase orders, newest order date first; `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        filter: PurchaseOrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let mut query = purchase_order::Entity::find();
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(purchase_order::Column::VendorId.eq(vendor_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(purchase_order::Column::OrderDate)
            .order_by_asc(purchase_order::Column::Id)
            .paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }
}
