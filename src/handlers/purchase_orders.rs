use super::common::{created_response, no_content_response, success_response, PaginationParams};
use crate::{
    auth::AuthUser,
    commands::purchase_orders::{
        AcknowledgeOutcome, CompletePurchaseOrderRequest, CreatePurchaseOrderCommand,
        UpdatePurchaseOrderRequest,
    },
    entities::purchase_order::{self, OrderItem, PurchaseOrderStatus},
    errors::{ApiError, ServiceError},
    services::purchase_orders::PurchaseOrderFilter,
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderResponse {
    pub id: Uuid,
    pub po_number: String,
    pub vendor_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: DateTime<Utc>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
    pub quantity: i32,
    pub status: PurchaseOrderStatus,
    pub quality_rating: Option<f64>,
    pub issue_date: DateTime<Utc>,
    pub acknowledgment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<purchase_order::Model> for PurchaseOrderResponse {
    fn from(model: purchase_order::Model) -> Self {
        Self {
            id: model.id,
            po_number: model.po_number,
            vendor_id: model.vendor_id,
            order_date: model.order_date,
            expected_delivery_date: model.expected_delivery_date,
            actual_delivery_date: model.actual_delivery_date,
            items: model.items.0,
            quantity: model.quantity,
            status: model.status,
            quality_rating: model.quality_rating,
            issue_date: model.issue_date,
            acknowledgment_date: model.acknowledgment_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// An empty body means "all defaults"; anything else must be valid JSON.
fn parse_optional_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: Default + serde::de::DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse the request body as JSON: {}", e)))
}

fn order_not_found(id: impl std::fmt::Display) -> ServiceError {
    ServiceError::NotFound(format!("Purchase order {} not found", id))
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    summary = "List purchase orders",
    description = "Paginated list, optionally filtered by vendor and status",
    params(PurchaseOrderFilter, PaginationParams),
    responses(
        (status = 200, description = "Purchase orders retrieved", body = ApiResponse<PaginatedResponse<PurchaseOrderResponse>>),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    filter: Result<Query<PurchaseOrderFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedResponse<PurchaseOrderResponse>>>, ApiError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let params = params.clamped(state.config.api_max_page_size);
    let (orders, total) = state
        .services
        .purchase_orders
        .list_purchase_orders(filter, params.page, params.per_page)
        .await?;
    let items = orders.into_iter().map(PurchaseOrderResponse::from).collect();
    Ok(success_response(params.into_response(items, total)))
}

/// Create a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    summary = "Create purchase order",
    description = "Creates a pending purchase order for an existing vendor and recomputes the vendor's metrics.",
    request_body = CreatePurchaseOrderCommand,
    responses(
        (status = 201, description = "Purchase order created", body = ApiResponse<PurchaseOrderResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "PO number already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: Result<Json<CreatePurchaseOrderCommand>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PurchaseOrderResponse>>), ApiError> {
    let Json(command) = payload?;
    let order = state
        .services
        .purchase_orders
        .create_purchase_order(command)
        .await?;
    info!(purchase_order_id = %order.id, user_id = %auth_user.user_id, "purchase order created via API");
    Ok(created_response(PurchaseOrderResponse::from(order)))
}

/// Get a purchase order by id
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    summary = "Get purchase order",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order retrieved", body = ApiResponse<PurchaseOrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<PurchaseOrderResponse>>, ApiError> {
    let Path(id) = id?;
    let order = state
        .services
        .purchase_orders
        .get_purchase_order(id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    Ok(success_response(PurchaseOrderResponse::from(order)))
}

/// Get a purchase order by its PO number
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/by-number/{po_number}",
    summary = "Get purchase order by number",
    params(("po_number" = String, Path, description = "Purchase order number")),
    responses(
        (status = 200, description = "Purchase order retrieved", body = ApiResponse<PurchaseOrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order_by_number(
    State(state): State<AppState>,
    po_number: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<PurchaseOrderResponse>>, ApiError> {
    let Path(po_number) = po_number?;
    let order = state
        .services
        .purchase_orders
        .get_purchase_order_by_number(&po_number)
        .await?
        .ok_or_else(|| order_not_found(&po_number))?;
    Ok(success_response(PurchaseOrderResponse::from(order)))
}

/// Partially update a purchase order
#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    summary = "Update purchase order",
    description = "Partial update. Status may move from pending to completed or cancelled; completed orders only accept a new quality_rating.",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    request_body = UpdatePurchaseOrderRequest,
    responses(
        (status = 200, description = "Purchase order updated", body = ApiResponse<PurchaseOrderResponse>),
        (status = 400, description = "Invalid data or lifecycle violation", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "PO number already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
    payload: Result<Json<UpdatePurchaseOrderRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PurchaseOrderResponse>>, ApiError> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    let order = state
        .services
        .purchase_orders
        .update_purchase_order(id, changes)
        .await?;
    info!(purchase_order_id = %id, status = %order.status, user_id = %auth_user.user_id, "purchase order updated via API");
    Ok(success_response(PurchaseOrderResponse::from(order)))
}

/// Delete a purchase order
#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    summary = "Delete purchase order",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 204, description = "Purchase order deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state
        .services
        .purchase_orders
        .delete_purchase_order(id)
        .await?;
    info!(purchase_order_id = %id, user_id = %auth_user.user_id, "purchase order deleted via API");
    Ok(no_content_response())
}

/// Record the vendor's acknowledgment of a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/acknowledge",
    summary = "Acknowledge purchase order",
    description = "Sets the acknowledgment date to now. Acknowledging twice succeeds without change.",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Acknowledged, or already acknowledged", body = ApiResponse<PurchaseOrderResponse>),
        (status = 400, description = "Order is no longer pending", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn acknowledge_purchase_order(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PurchaseOrderResponse>>, ApiError> {
    let Path(id) = id?;
    let outcome = state
        .services
        .purchase_orders
        .acknowledge_purchase_order(id)
        .await?;
    let message = match &outcome {
        AcknowledgeOutcome::Acknowledged(_) => "Purchase order acknowledged",
        AcknowledgeOutcome::AlreadyAcknowledged(_) => "Purchase order already acknowledged",
    };
    info!(purchase_order_id = %id, user_id = %auth_user.user_id, "{}", message);
    Ok(Json(ApiResponse::success_with_message(
        PurchaseOrderResponse::from(outcome.into_order()),
        message,
    )))
}

/// Complete a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/complete",
    summary = "Complete purchase order",
    description = "Marks a pending order completed. The delivery date defaults to now; a quality rating may be supplied.",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    request_body(content = CompletePurchaseOrderRequest, description = "Optional delivery date and rating"),
    responses(
        (status = 200, description = "Purchase order completed", body = ApiResponse<PurchaseOrderResponse>),
        (status = 400, description = "Invalid data or order not pending", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn complete_purchase_order(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
    body: Bytes,
) -> Result<Json<ApiResponse<PurchaseOrderResponse>>, ApiError> {
    let Path(id) = id?;
    let request = parse_optional_body::<CompletePurchaseOrderRequest>(&body)?;
    let order = state
        .services
        .purchase_orders
        .complete_purchase_order(id, request)
        .await?;
    info!(purchase_order_id = %id, user_id = %auth_user.user_id, "purchase order completed via API");
    Ok(success_response(PurchaseOrderResponse::from(order)))
}

/// Cancel a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    summary = "Cancel purchase order",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order cancelled", body = ApiResponse<PurchaseOrderResponse>),
        (status = 400, description = "Order not pending", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PurchaseOrderResponse>>, ApiError> {
    let Path(id) = id?;
    let order = state
        .services
        .purchase_orders
        .cancel_purchase_order(id)
        .await?;
    info!(purchase_order_id = %id, user_id = %auth_user.user_id, "purchase order cancelled via API");
    Ok(success_response(PurchaseOrderResponse::from(order)))
}
