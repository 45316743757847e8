//! Purchase order lifecycle rules.
//!
//! `pending` moves to `completed` or `cancelled` exactly once. A cancelled
//! order is frozen; a completed order only accepts a new quality rating.
//! Planning is pure: callers load the current row, plan, then persist.

use super::update_purchase_order_command::UpdatePurchaseOrderRequest;
use crate::{
    entities::purchase_order::{self, OrderItem, OrderItems, PurchaseOrderStatus},
    errors::{FieldError, ServiceError},
};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use validator::ValidationError;

/// The next state of an order plus the status transition it makes, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub order: purchase_order::Model,
    pub status_change: Option<(PurchaseOrderStatus, PurchaseOrderStatus)>,
}

pub(crate) fn validate_items(items: &[OrderItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(invalid("items_empty", "at least one item is required"));
    }
    if items.iter().any(|item| item.quantity < 1) {
        return Err(invalid("item_quantity", "every item quantity must be at least 1"));
    }
    if items.iter().any(|item| item.description.trim().is_empty()) {
        return Err(invalid("item_description", "every item needs a description"));
    }
    Ok(())
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn check_acknowledgment(order: &purchase_order::Model) -> Result<(), ServiceError> {
    match order.acknowledgment_date {
        Some(ack) if ack < order.issue_date => Err(ServiceError::InvalidFields(vec![
            FieldError::new("acknowledgment_date", "must not precede issue_date"),
        ])),
        _ => Ok(()),
    }
}

/// Applies `changes` to `current` and checks the result against the lifecycle.
///
/// Returns `Ok(None)` when the request would leave the order unchanged.
pub fn plan_update(
    current: &purchase_order::Model,
    changes: &UpdatePurchaseOrderRequest,
    now: DateTime<Utc>,
) -> Result<Option<PlannedUpdate>, ServiceError> {
    let mut next = current.clone();
    if let Some(po_number) = &changes.po_number {
        next.po_number = po_number.trim().to_string();
    }
    if let Some(order_date) = changes.order_date {
        next.order_date = order_date;
    }
    if let Some(expected) = changes.expected_delivery_date {
        next.expected_delivery_date = expected;
    }
    if let Some(actual) = changes.actual_delivery_date {
        next.actual_delivery_date = Some(actual);
    }
    if let Some(items) = &changes.items {
        next.items = OrderItems(items.clone());
    }
    if let Some(quantity) = changes.quantity {
        next.quantity = quantity;
    }
    if let Some(rating) = changes.quality_rating {
        next.quality_rating = Some(rating);
    }
    if let Some(issue_date) = changes.issue_date {
        next.issue_date = issue_date;
    }
    if let Some(ack) = changes.acknowledgment_date {
        next.acknowledgment_date = Some(ack);
    }

    let target = changes.status.unwrap_or(current.status);
    match current.status {
        PurchaseOrderStatus::Cancelled => {
            if target != PurchaseOrderStatus::Cancelled || next != *current {
                return Err(ServiceError::InvalidStatus(format!(
                    "purchase order {} is cancelled and cannot be modified",
                    current.po_number
                )));
            }
        }
        PurchaseOrderStatus::Completed => {
            if target != PurchaseOrderStatus::Completed {
                return Err(ServiceError::InvalidStatus(format!(
                    "purchase order {} is completed and cannot move to {}",
                    current.po_number, target
                )));
            }
            let mut without_rating = next.clone();
            without_rating.quality_rating = current.quality_rating;
            if without_rating != *current {
                return Err(ServiceError::InvalidStatus(format!(
                    "only quality_rating may change on completed purchase order {}",
                    current.po_number
                )));
            }
        }
        PurchaseOrderStatus::Pending => {
            if target != PurchaseOrderStatus::Completed {
                let mut fields = Vec::new();
                if changes.quality_rating.is_some() {
                    fields.push(FieldError::new(
                        "quality_rating",
                        "can only be set when completing the order",
                    ));
                }
                if changes.actual_delivery_date.is_some() {
                    fields.push(FieldError::new(
                        "actual_delivery_date",
                        "can only be set when completing the order",
                    ));
                }
                if !fields.is_empty() {
                    return Err(ServiceError::InvalidFields(fields));
                }
            }
            next.status = target;
            if target == PurchaseOrderStatus::Completed && next.actual_delivery_date.is_none() {
                next.actual_delivery_date = Some(now);
            }
        }
    }

    check_acknowledgment(&next)?;

    if next == *current {
        return Ok(None);
    }
    let status_change = (next.status != current.status).then_some((current.status, next.status));
    Ok(Some(PlannedUpdate {
        order: next,
        status_change,
    }))
}

/// Plans an acknowledgment at `now`. `Ok(None)` means already acknowledged.
pub fn plan_acknowledgment(
    current: &purchase_order::Model,
    now: DateTime<Utc>,
) -> Result<Option<purchase_order::Model>, ServiceError> {
    if current.acknowledgment_date.is_some() {
        return Ok(None);
    }
    if current.status.is_terminal() {
        return Err(ServiceError::InvalidStatus(format!(
            "purchase order {} is {} and can no longer be acknowledged",
            current.po_number, current.status
        )));
    }
    if now < current.issue_date {
        return Err(ServiceError::InvalidOperation(format!(
            "purchase order {} has not been issued yet",
            current.po_number
        )));
    }
    let mut next = current.clone();
    next.acknowledgment_date = Some(now);
    Ok(Some(next))
}

/// Terminal transitions through the dedicated endpoints require a pending order.
pub fn ensure_pending(current: &purchase_order::Model, action: &str) -> Result<(), ServiceError> {
    if current.status.is_terminal() {
        return Err(ServiceError::InvalidStatus(format!(
            "cannot {} purchase order {}: it is already {}",
            action, current.po_number, current.status
        )));
    }
    Ok(())
}
