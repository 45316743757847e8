//! Vendor management API.
//!
//! Vendor profiles, purchase orders and per-vendor performance metrics
//! served over an authenticated JSON API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod performance;
pub mod services;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService, RequirePermission};
use crate::db::DbPool;
use crate::events::EventSender;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires services and auth around an open database connection.
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, event_sender: EventSender) -> Self {
        let event_sender = Arc::new(event_sender);
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from_app_config(&config),
            db.clone(),
        ));
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
            auth,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}


/// Authenticated `/api/v1` routes; each method carries its own permission.
pub fn api_v1_routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    use handlers::{performance, purchase_orders, vendors};

    Router::new()
        .route(
            "/vendors",
            get(vendors::list_vendors)
                .require(perm::VENDORS_READ)
                .merge(post(vendors::create_vendor).require(perm::VENDORS_MANAGE)),
        )
        .route(
            "/vendors/by-code/:code",
            get(vendors::get_vendor_by_code).require(perm::VENDORS_READ),
        )
        .route(
            "/vendors/:id",
            get(vendors::get_vendor)
                .require(perm::VENDORS_READ)
                .merge(
                    axum::routing::put(vendors::update_vendor).require(perm::VENDORS_MANAGE),
                )
                .merge(
                    axum::routing::delete(vendors::delete_vendor).require(perm::VENDORS_MANAGE),
                ),
        )
        .route(
            "/vendors/:id/performance",
            get(performance::get_vendor_performance).require(perm::VENDORS_READ),
        )
        .route(
            "/vendors/:id/performance/history",
            get(performance::get_vendor_performance_history).require(perm::VENDORS_READ),
        )
        .route(
            "/vendors/:id/performance/recompute",
            post(performance::recompute_vendor_performance).require(perm::VENDORS_MANAGE),
        )
        .route(
            "/purchase-orders",
            get(purchase_orders::list_purchase_orders)
                .require(perm::PURCHASE_ORDERS_READ)
                .merge(
                    post(purchase_orders::create_purchase_order)
                        .require(perm::PURCHASE_ORDERS_MANAGE),
                ),
        )
        .route(
            "/purchase-orders/by-number/:po_number",
            get(purchase_orders::get_purchase_order_by_number).require(perm::PURCHASE_ORDERS_READ),
        )
        .route(
            "/purchase-orders/:id",
            get(purchase_orders::get_purchase_order)
                .require(perm::PURCHASE_ORDERS_READ)
                .merge(
                    axum::routing::put(purchase_orders::update_purchase_order)
                        .require(perm::PURCHASE_ORDERS_MANAGE),
                )
                .merge(
                    axum::routing::delete(purchase_orders::delete_purchase_order)
                        .require(perm::PURCHASE_ORDERS_MANAGE),
                ),
        )
        .route(
            "/purchase-orders/:id/acknowledge",
            post(purchase_orders::acknowledge_purchase_order).require(perm::PURCHASE_ORDERS_MANAGE),
        )
        .route(
            "/purchase-orders/:id/complete",
            post(purchase_orders::complete_purchase_order).require(perm::PURCHASE_ORDERS_MANAGE),
        )
        .route(
            "/purchase-orders/:id/cancel",
            post(purchase_orders::cancel_purchase_order).require(perm::PURCHASE_ORDERS_MANAGE),
        )
        .with_auth(auth_service)
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        // Config validation only lets this through in development or with an explicit opt-in.
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}

/// Builds the complete application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/", get(handlers::health::root))
        .route("/status", get(handlers::health::status))
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/auth/login", post(handlers::auth::login))
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Outermost, so every layer and handler sees the request id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
