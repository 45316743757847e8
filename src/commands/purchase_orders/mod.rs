pub mod acknowledge_purchase_order_command;
pub mod cancel_purchase_order_command;
pub mod complete_purchase_order_command;
pub mod create_purchase_order_command;
pub mod delete_purchase_order_command;
pub mod lifecycle;
pub mod update_purchase_order_command;

pub use acknowledge_purchase_order_command::{AcknowledgeOutcome, AcknowledgePurchaseOrderCommand};
pub use cancel_purchase_order_command::CancelPurchaseOrderCommand;
pub use complete_purchase_order_command::{CompletePurchaseOrderCommand, CompletePurchaseOrderRequest};
pub use create_purchase_order_command::CreatePurchaseOrderCommand;
pub use delete_purchase_order_command::DeletePurchaseOrderCommand;
pub use update_purchase_order_command::{UpdatePurchaseOrderCommand, UpdatePurchaseOrderRequest};

use crate::{
    commands::performance::{recompute_vendor_metrics, RecomputeOutcome},
    entities::purchase_order,
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

pub(crate) async fn load_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))
}

pub(crate) async fn ensure_po_number_free<C: ConnectionTrait>(
    conn: &C,
    po_number: &str,
) -> Result<(), ServiceError> {
    let existing = purchase_order::Entity::find()
        .filter(purchase_order::Column::PoNumber.eq(po_number))
        .one(conn)
        .await?;
    match existing {
        Some(_) => Err(ServiceError::Conflict(format!(
            "Purchase order number '{}' already exists",
            po_number
        ))),
        None => Ok(()),
    }
}

/// Writes a planned order state and recomputes the owning vendor's metrics on
/// the same connection.
pub(crate) async fn store_and_recompute<C: ConnectionTrait>(
    conn: &C,
    order: purchase_order::Model,
    now: DateTime<Utc>,
) -> Result<(purchase_order::Model, RecomputeOutcome), ServiceError> {
    let vendor_id = order.vendor_id;
    let active = purchase_order::ActiveModel {
        id: Unchanged(order.id),
        po_number: Set(order.po_number),
        vendor_id: Unchanged(order.vendor_id),
        order_date: Set(order.order_date),
        expected_delivery_date: Set(order.expected_delivery_date),
        actual_delivery_date: Set(order.actual_delivery_date),
        items: Set(order.items),
        quantity: Set(order.quantity),
        status: Set(order.status),
        quality_rating: Set(order.quality_rating),
        issue_date: Set(order.issue_date),
        acknowledgment_date: Set(order.acknowledgment_date),
        created_at: Unchanged(order.created_at),
        updated_at: Set(now),
    };
    let saved = active.update(conn).await?;
    let outcome = recompute_vendor_metrics(conn, vendor_id, now).await?;
    Ok((saved, outcome))
}
