use super::common::{success_response, PaginationParams};
use crate::{
    auth::AuthUser,
    entities::historical_performance,
    errors::ApiError,
    services::performance::VendorPerformance,
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// One recorded metrics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceSnapshotResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub on_time_delivery_rate: f64,
    pub quality_rating_average: f64,
    pub average_response_time: f64,
    pub fulfilment_rate: f64,
    pub metrics_version: i32,
}

impl From<historical_performance::Model> for PerformanceSnapshotResponse {
    fn from(model: historical_performance::Model) -> Self {
        Self {
            id: model.id,
            vendor_id: model.vendor_id,
            recorded_at: model.recorded_at,
            on_time_delivery_rate: model.on_time_delivery_rate,
            quality_rating_average: model.quality_rating_average,
            average_response_time: model.average_response_time,
            fulfilment_rate: model.fulfilment_rate,
            metrics_version: model.metrics_version,
        }
    }
}

/// Current performance metrics of a vendor
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}/performance",
    summary = "Get vendor performance",
    params(("id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Current metrics", body = ApiResponse<VendorPerformance>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "performance"
)]
pub async fn get_vendor_performance(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<VendorPerformance>>, ApiError> {
    let Path(id) = id?;
    let performance = state.services.performance.current(id).await?;
    Ok(success_response(performance))
}

/// Recorded metric snapshots of a vendor, newest first
#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}/performance/history",
    summary = "Get vendor performance history",
    params(("id" = Uuid, Path, description = "Vendor ID"), PaginationParams),
    responses(
        (status = 200, description = "Snapshots, newest first", body = ApiResponse<PaginatedResponse<PerformanceSnapshotResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "performance"
)]
pub async fn get_vendor_performance_history(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedResponse<PerformanceSnapshotResponse>>>, ApiError> {
    let Path(id) = id?;
    let Query(params) = params?;
    let params = params.clamped(state.config.api_max_page_size);
    let (snapshots, total) = state
        .services
        .performance
        .history(id, params.page, params.per_page)
        .await?;
    let items = snapshots
        .into_iter()
        .map(PerformanceSnapshotResponse::from)
        .collect();
    Ok(success_response(params.into_response(items, total)))
}

/// Recompute a vendor's metrics from its current orders
#[utoipa::path(
    post,
    path = "/api/v1/vendors/{id}/performance/recompute",
    summary = "Recompute vendor performance",
    params(("id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Recomputed metrics", body = ApiResponse<VendorPerformance>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "performance"
)]
pub async fn recompute_vendor_performance(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<VendorPerformance>>, ApiError> {
    let Path(id) = id?;
    let outcome = state.services.performance.recompute(id).await?;
    info!(
        vendor_id = %id,
        metrics_version = outcome.vendor.metrics_version,
        user_id = %auth_user.user_id,
        "vendor metrics recomputed via API"
    );
    Ok(success_response(VendorPerformance::from(&outcome.vendor)))
}
