use super::common::{created_response, no_content_response, success_response, PaginationParams};
use crate::{
    auth::AuthUser,
    commands::vendors::{CreateVendorCommand, UpdateVendorRequest},
    entities::vendor,
    errors::{ApiError, ServiceError},
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
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

/// A vendor profile with its current performance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VendorResponse {
    pub id: Uuid,
    pub vendor_code: String,
    pub name: String,
    pub contact_details: String,
    pub address: String,
    pub on_time_delivery_rate: f64,
    pub quality_rating_average: f64,
    /// Seconds
    pub average_response_time: f64,
    pub fulfilment_rate: f64,
    pub metrics_version: i32,
    pub metrics_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<vendor::Model> for VendorResponse {
    fn from(model: vendor::Model) -> Self {
        Self {
            id: model.id,
            vendor_code: model.vendor_code,
            name: model.name,
            contact_details: model.contact_details,
            address: model.address,
            on_time_delivery_rate: model.on_time_delivery_rate,
            quality_rating_average: model.quality_rating_average,
            average_response_time: model.average_response_time,
            fulfilment_rate: model.fulfilment_rate,
            metrics_version: model.metrics_version,
            metrics_updated_at: model.metrics_updated_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn vendor_not_found(id: impl std::fmt::Display) -> ServiceError {
    ServiceError::NotFound(format!("Vendor {} not found", id))
}

/// List vendors
#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    summary = "List vendors",
    params(PaginationParams),
    responses(
        (status = 200, description = "Vendors retrieved", body = ApiResponse<PaginatedResponse<VendorResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn list_vendors(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedResponse<VendorResponse>>>, ApiError> {
    let Query(params) = params?;
    let params = params.clamped(state.config.api_max_page_size);
    let (vendors, total) = state
        .services
        .vendors
        .list_vendors(params.page, params.per_page)
        .await?;
    let items = vendors.into_iter().map(VendorResponse::from).collect();
    Ok(success_response(params.into_response(items, total)))
}

/// Create a vendor
#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    summary = "Create vendor",
    description = "Registers a vendor. Performance metrics start at zero and cannot be supplied.",
    request_body = CreateVendorCommand,
    responses(
        (status = 201, description = "Vendor created", body = ApiResponse<VendorResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Vendor code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: Result<Json<CreateVendorCommand>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<VendorResponse>>), ApiError> {
    let Json(command) = payload?;
    let vendor = state.services.vendors.create_vendor(command).await?;
    info!(vendor_id = %vendor.id, user_id = %auth_user.user_id, "vendor created via API");
    Ok(created_response(VendorResponse::from(vendor)))
}

/// Get a vendor by id
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}",
    summary = "Get vendor",
    params(("id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Vendor retrieved", body = ApiResponse<VendorResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<VendorResponse>>, ApiError> {
    let Path(id) = id?;
    let vendor = state
        .services
        .vendors
        .get_vendor(id)
        .await?
        .ok_or_else(|| vendor_not_found(id))?;
    Ok(success_response(VendorResponse::from(vendor)))
}

/// Get a vendor by its vendor code
#[utoipa::path(
    get,
    path = "/api/v1/vendors/by-code/{code}",
    summary = "Get vendor by code",
    params(("code" = String, Path, description = "Vendor code")),
    responses(
        (status = 200, description = "Vendor retrieved", body = ApiResponse<VendorResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn get_vendor_by_code(
    State(state): State<AppState>,
    code: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<VendorResponse>>, ApiError> {
    let Path(code) = code?;
    let vendor = state
        .services
        .vendors
        .get_vendor_by_code(&code)
        .await?
        .ok_or_else(|| vendor_not_found(&code))?;
    Ok(success_response(VendorResponse::from(vendor)))
}

/// Partially update a vendor profile
#[utoipa::path(
    put,
    path = "/api/v1/vendors/{id}",
    summary = "Update vendor",
    description = "Only the supplied profile fields change. Metric fields are rejected.",
    params(("id" = Uuid, Path, description = "Vendor ID")),
    request_body = UpdateVendorRequest,
    responses(
        (status = 200, description = "Vendor updated", body = ApiResponse<VendorResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Vendor code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
    payload: Result<Json<UpdateVendorRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VendorResponse>>, ApiError> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    let vendor = state.services.vendors.update_vendor(id, changes).await?;
    info!(vendor_id = %id, user_id = %auth_user.user_id, "vendor updated via API");
    Ok(success_response(VendorResponse::from(vendor)))
}

/// Delete a vendor with its purchase orders and history
#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}",
    summary = "Delete vendor",
    params(("id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 204, description = "Vendor deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "vendors"
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.services.vendors.delete_vendor(id).await?;
    info!(vendor_id = %id, user_id = %auth_user.user_id, "vendor deleted via API");
    Ok(no_content_response())
}
