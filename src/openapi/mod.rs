use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vendor API",
        version = "1.0.0",
        description = r#"
# Vendor Management API

Vendor profiles, purchase orders and per-vendor performance metrics.

## Authentication

Every `/api/v1` endpoint requires a bearer token obtained from `POST /auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Missing or invalid tokens yield `401`; tokens lacking the endpoint's permission yield `403`.

## Performance metrics

Each vendor carries four metrics derived from its purchase orders:
`on_time_delivery_rate`, `quality_rating_average`, `average_response_time` (seconds)
and `fulfilment_rate`. They are recomputed in the same transaction as every purchase
order change; `metrics_version` increments on each recompute and a snapshot is
appended to the vendor's performance history.

## Errors

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "fields": [{"field": "quantity", "message": "quantity must be at least 1"}],
  "request_id": "6f1c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20, capped by configuration).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "vendors", description = "Vendor profile endpoints"),
        (name = "purchase-orders", description = "Purchase order lifecycle endpoints"),
        (name = "performance", description = "Vendor performance metrics"),
        (name = "auth", description = "Token issuance"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::vendors::list_vendors,
        crate::handlers::vendors::create_vendor,
        crate::handlers::vendors::get_vendor,
        crate::handlers::vendors::get_vendor_by_code,
        crate::handlers::vendors::update_vendor,
        crate::handlers::vendors::delete_vendor,

        crate::handlers::performance::get_vendor_performance,
        crate::handlers::performance::get_vendor_performance_history,
        crate::handlers::performance::recompute_vendor_performance,

        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order_by_number,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::delete_purchase_order,
        crate::handlers::purchase_orders::acknowledge_purchase_order,
        crate::handlers::purchase_orders::complete_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,

        crate::handlers::auth::login,
        crate::handlers::health::health,
    ),
    components(
        schemas(
            crate::handlers::vendors::VendorResponse,
            crate::commands::vendors::CreateVendorCommand,
            crate::commands::vendors::UpdateVendorRequest,

            crate::handlers::purchase_orders::PurchaseOrderResponse,
            crate::commands::purchase_orders::CreatePurchaseOrderCommand,
            crate::commands::purchase_orders::UpdatePurchaseOrderRequest,
            crate::commands::purchase_orders::CompletePurchaseOrderRequest,
            crate::entities::purchase_order::PurchaseOrderStatus,
            crate::entities::purchase_order::OrderItem,

            crate::handlers::performance::PerformanceSnapshotResponse,
            crate::services::performance::VendorPerformance,
            crate::performance::PerformanceMetrics,

            crate::auth::LoginCredentials,
            crate::auth::TokenResponse,
            crate::handlers::health::HealthResponse,
            crate::errors::ErrorResponse,
            crate::errors::FieldError
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}
