/*!
 * # Metrics Module
 *
 * Process-wide Prometheus counters for the vendor API, exported in the
 * Prometheus text format at `/metrics`.
 */

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new_custom(Some("vendor_api".into()), None)
        .expect("registry prefix is a valid metric name");
    pub static ref VENDORS_CREATED: IntCounter = register_counter(
        "vendors_created_total",
        "Total number of vendors created"
    );
    pub static ref VENDORS_DELETED: IntCounter = register_counter(
        "vendors_deleted_total",
        "Total number of vendors deleted"
    );
    pub static ref PURCHASE_ORDERS_CREATED: IntCounter = register_counter(
        "purchase_orders_created_total",
        "Total number of purchase orders created"
    );
    pub static ref PURCHASE_ORDERS_COMPLETED: IntCounter = register_counter(
        "purchase_orders_completed_total",
        "Total number of purchase orders completed"
    );
    pub static ref PURCHASE_ORDERS_CANCELLED: IntCounter = register_counter(
        "purchase_orders_cancelled_total",
        "Total number of purchase orders cancelled"
    );
    pub static ref METRIC_RECOMPUTES: IntCounter = register_counter(
        "vendor_metric_recomputes_total",
        "Total number of vendor performance recomputations"
    );
    pub static ref COMMAND_FAILURES: IntCounterVec = {
        let counter = IntCounterVec::new(
            Opts::new("command_failures_total", "Failed commands by command name"),
            &["command"],
        )
        .expect("metric can be created");
        if let Err(err) = REGISTRY.register(Box::new(counter.clone())) {
            error!("failed to register command_failures_total: {}", err);
        }
        counter
    };
    pub static ref AUTH_FAILURES: IntCounter = register_counter(
        "auth_failures_total",
        "Total number of rejected authentication attempts"
    );
}

fn register_counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric can be created");
    if let Err(err) = REGISTRY.register(Box::new(counter.clone())) {
        error!("failed to register {}: {}", name, err);
    }
    counter
}

/// Records a failed command under its name.
pub fn record_command_failure(command: &str) {
    COMMAND_FAILURES.with_label_values(&[command]).inc();
}

/// Renders every registered metric in the Prometheus text format.
pub fn export_metrics() -> Result<String, prometheus::Error> {
    // Touch the lazies so an idle process still exports zeroed series.
    lazy_static::initialize(&VENDORS_CREATED);
    lazy_static::initialize(&VENDORS_DELETED);
    lazy_static::initialize(&PURCHASE_ORDERS_CREATED);
    lazy_static::initialize(&PURCHASE_ORDERS_COMPLETED);
    lazy_static::initialize(&PURCHASE_ORDERS_CANCELLED);
    lazy_static::initialize(&METRIC_RECOMPUTES);
    lazy_static::initialize(&COMMAND_FAILURES);
    lazy_static::initialize(&AUTH_FAILURES);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// `GET /metrics`
pub async fn metrics_handler() -> Response {
    match export_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!("failed to export metrics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
