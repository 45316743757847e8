mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};
use uuid::Uuid;
use vendor_api::entities::purchase_order;

use common::TestApp;

async fn history_total(app: &TestApp, vendor_id: &str) -> u64 {
    let body = app
        .call(
            Method::GET,
            &format!("/api/v1/vendors/{}/performance/history", vendor_id),
            None,
            StatusCode::OK,
        )
        .await;
    body["data"]["total"].as_u64().expect("history total")
}

async fn performance(app: &TestApp, vendor_id: &str) -> Value {
    app.call(
        Method::GET,
        &format!("/api/v1/vendors/{}/performance", vendor_id),
        None,
        StatusCode::OK,
    )
    .await["data"]
        .clone()
}

async fn complete(app: &TestApp, order: &Value, body: Value) -> Value {
    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/complete", order["id"].as_str().unwrap()),
        Some(body),
        StatusCode::OK,
    )
    .await["data"]
        .clone()
}

#[tokio::test]
async fn create_for_unknown_vendor_is_not_found_and_persists_nothing() {
    let app = TestApp::new().await;

    app.call(
        Method::POST,
        "/api/v1/purchase-orders",
        Some(json!({
            "po_number": "PO-ORPHAN",
            "vendor_id": Uuid::new_v4(),
            "expected_delivery_date": "2024-01-10",
            "items": [{ "description": "Nuts", "quantity": 1 }],
            "quantity": 1,
        })),
        StatusCode::NOT_FOUND,
    )
    .await;

    let stored = purchase_order::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn new_order_is_pending_and_unacknowledged() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-NEW").await;

    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-1", "2024-01-01", "2024-01-10")
        .await;

    assert_eq!(order["status"], "pending");
    assert!(order["acknowledgment_date"].is_null());
    assert!(order["actual_delivery_date"].is_null());
    assert!(order["quality_rating"].is_null());
    assert_eq!(order["items"][0]["description"], "Steel bolts");
}

#[tokio::test]
async fn duplicate_po_number_conflicts() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-DUP").await;
    let vendor_id = vendor["id"].as_str().unwrap();
    app.create_order(vendor_id, "PO-SAME", "2024-01-01", "2024-01-10")
        .await;

    app.call(
        Method::POST,
        "/api/v1/purchase-orders",
        Some(json!({
            "po_number": "PO-SAME",
            "vendor_id": vendor_id,
            "expected_delivery_date": "2024-01-10",
            "items": [{ "description": "Nuts", "quantity": 1 }],
            "quantity": 1,
        })),
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
async fn invalid_items_are_rejected() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-ITEMS").await;

    let body = app
        .call(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "po_number": "PO-EMPTY",
                "vendor_id": vendor["id"],
                "expected_delivery_date": "2024-01-10",
                "items": [],
                "quantity": 0,
            })),
            StatusCode::BAD_REQUEST,
        )
        .await;

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["items", "quantity"]);
}

#[tokio::test]
async fn completing_orders_updates_vendor_metrics() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-METRICS").await;
    let vendor_id = vendor["id"].as_str().unwrap();

    let on_time = app
        .create_order(vendor_id, "PO-ON-TIME", "2024-01-01", "2024-01-10")
        .await;
    let late = app
        .create_order(vendor_id, "PO-LATE", "2024-01-01", "2024-01-10")
        .await;
    app.create_order(vendor_id, "PO-OPEN", "2024-01-01", "2024-01-10")
        .await;

    let completed = complete(
        &app,
        &on_time,
        json!({ "actual_delivery_date": "2024-01-09", "quality_rating": 4.0 }),
    )
    .await;
    assert_eq!(completed["status"], "completed");

    let metrics = performance(&app, vendor_id).await;
    assert_eq!(metrics["on_time_delivery_rate"], 1.0);
    assert_eq!(metrics["quality_rating_average"], 4.0);

    complete(
        &app,
        &late,
        json!({ "actual_delivery_date": "2024-01-15", "quality_rating": 5.0 }),
    )
    .await;

    let metrics = performance(&app, vendor_id).await;
    assert_eq!(metrics["on_time_delivery_rate"], 0.5);
    assert_eq!(metrics["quality_rating_average"], 4.5);
    let fulfilment = metrics["fulfilment_rate"].as_f64().unwrap();
    assert!((fulfilment - 2.0 / 3.0).abs() < 1e-9);

    let vendor_view = app
        .call(
            Method::GET,
            &format!("/api/v1/vendors/{}", vendor_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(vendor_view["data"]["on_time_delivery_rate"], 0.5);
    assert_eq!(vendor_view["data"]["metrics_version"], metrics["metrics_version"]);
}

#[tokio::test]
async fn completion_without_delivery_date_stamps_now() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-STAMP").await;
    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-STAMP", "2024-01-01", "2999-01-01")
        .await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/purchase-orders/{}/complete", order["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::response_json(response).await;
    assert!(body["data"]["actual_delivery_date"].is_string());

    let metrics = performance(&app, vendor["id"].as_str().unwrap()).await;
    assert_eq!(metrics["on_time_delivery_rate"], 1.0);
    assert_eq!(metrics["fulfilment_rate"], 1.0);
}

#[tokio::test]
async fn every_mutation_appends_exactly_one_snapshot() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-HISTORY").await;
    let vendor_id = vendor["id"].as_str().unwrap();
    assert_eq!(history_total(&app, vendor_id).await, 0);

    let order = app
        .create_order(vendor_id, "PO-H1", "2024-01-01", "2024-01-10")
        .await;
    assert_eq!(history_total(&app, vendor_id).await, 1);

    let ack_uri = format!("/api/v1/purchase-orders/{}/acknowledge", order["id"].as_str().unwrap());
    app.call(Method::POST, &ack_uri, None, StatusCode::OK).await;
    assert_eq!(history_total(&app, vendor_id).await, 2);

    // A repeated acknowledgment changes nothing.
    app.call(Method::POST, &ack_uri, None, StatusCode::OK).await;
    assert_eq!(history_total(&app, vendor_id).await, 2);

    complete(&app, &order, json!({ "actual_delivery_date": "2024-01-05" })).await;
    assert_eq!(history_total(&app, vendor_id).await, 3);

    app.call(
        Method::DELETE,
        &format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap()),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    assert_eq!(history_total(&app, vendor_id).await, 4);

    let history = app
        .call(
            Method::GET,
            &format!("/api/v1/vendors/{}/performance/history?per_page=1", vendor_id),
            None,
            StatusCode::OK,
        )
        .await;
    let newest = &history["data"]["items"][0];
    assert_eq!(newest["metrics_version"], 4);
    assert_eq!(newest["fulfilment_rate"], 0.0);
    assert_eq!(performance(&app, vendor_id).await["metrics_version"], 4);
}

#[tokio::test]
async fn acknowledge_reports_repeat_without_error() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-ACK").await;
    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-ACK", "2024-01-01", "2024-01-10")
        .await;
    let uri = format!("/api/v1/purchase-orders/{}/acknowledge", order["id"].as_str().unwrap());

    let first = app.call(Method::POST, &uri, None, StatusCode::OK).await;
    assert_eq!(first["message"], "Purchase order acknowledged");
    let acked_at = first["data"]["acknowledgment_date"].clone();
    assert!(acked_at.is_string());

    let second = app.call(Method::POST, &uri, None, StatusCode::OK).await;
    assert_eq!(second["message"], "Purchase order already acknowledged");
    assert_eq!(second["data"]["acknowledgment_date"], acked_at);
}

#[tokio::test]
async fn acknowledge_before_issue_is_rejected() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-EARLY").await;
    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-FUTURE", "2999-01-01", "2999-02-01")
        .await;

    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/acknowledge", order["id"].as_str().unwrap()),
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn terminal_orders_reject_further_transitions() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-TERM").await;
    let vendor_id = vendor["id"].as_str().unwrap();
    let done = app
        .create_order(vendor_id, "PO-DONE", "2024-01-01", "2024-01-10")
        .await;
    let dropped = app
        .create_order(vendor_id, "PO-DROPPED", "2024-01-01", "2024-01-10")
        .await;
    let done_id = done["id"].as_str().unwrap();
    let dropped_id = dropped["id"].as_str().unwrap();

    complete(&app, &done, json!({ "actual_delivery_date": "2024-01-08" })).await;
    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/cancel", dropped_id),
        None,
        StatusCode::OK,
    )
    .await;

    let versions_before = performance(&app, vendor_id).await["metrics_version"].clone();

    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/cancel", done_id),
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/complete", dropped_id),
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.call(
        Method::PUT,
        &format!("/api/v1/purchase-orders/{}", dropped_id),
        Some(json!({ "quantity": 99 })),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.call(
        Method::PUT,
        &format!("/api/v1/purchase-orders/{}", done_id),
        Some(json!({ "status": "pending" })),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/acknowledge", dropped_id),
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;

    assert_eq!(
        performance(&app, vendor_id).await["metrics_version"],
        versions_before
    );
}

#[tokio::test]
async fn completed_order_accepts_a_new_rating_only() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-RATE").await;
    let vendor_id = vendor["id"].as_str().unwrap();
    let order = app
        .create_order(vendor_id, "PO-RATE", "2024-01-01", "2024-01-10")
        .await;
    let uri = format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap());
    complete(&app, &order, json!({ "quality_rating": 2.0, "actual_delivery_date": "2024-01-02" })).await;

    let rerated = app
        .call(Method::PUT, &uri, Some(json!({ "quality_rating": 5.0 })), StatusCode::OK)
        .await;
    assert_eq!(rerated["data"]["quality_rating"], 5.0);
    assert_eq!(performance(&app, vendor_id).await["quality_rating_average"], 5.0);

    app.call(
        Method::PUT,
        &uri,
        Some(json!({ "quantity": 3 })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn rating_a_pending_order_is_rejected() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-PENDING").await;
    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-PENDING", "2024-01-01", "2024-01-10")
        .await;

    let body = app
        .call(
            Method::PUT,
            &format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap()),
            Some(json!({ "quality_rating": 3.0 })),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["fields"][0]["field"], "quality_rating");

    app.call(
        Method::POST,
        &format!("/api/v1/purchase-orders/{}/complete", order["id"].as_str().unwrap()),
        Some(json!({ "quality_rating": 7.5 })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn vendor_id_cannot_be_reassigned() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-OWNER").await;
    let other = app.create_vendor("V-OTHER").await;
    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-OWNED", "2024-01-01", "2024-01-10")
        .await;

    app.call(
        Method::PUT,
        &format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap()),
        Some(json!({ "vendor_id": other["id"] })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn pending_field_edits_are_saved() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-EDIT").await;
    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-EDIT", "2024-01-01", "2024-01-10")
        .await;
    let uri = format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap());

    let edited = app
        .call(
            Method::PUT,
            &uri,
            Some(json!({
                "po_number": "PO-EDIT-2",
                "quantity": 25,
                "expected_delivery_date": "2024-01-20 12:00:00",
            })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(edited["data"]["po_number"], "PO-EDIT-2");
    assert_eq!(edited["data"]["quantity"], 25);
    assert_eq!(edited["data"]["status"], "pending");

    app.call(
        Method::GET,
        "/api/v1/purchase-orders/by-number/PO-EDIT-2",
        None,
        StatusCode::OK,
    )
    .await;
    app.call(
        Method::GET,
        "/api/v1/purchase-orders/by-number/PO-EDIT",
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn list_filters_by_vendor_and_status() {
    let app = TestApp::new().await;
    let first = app.create_vendor("V-LIST-A").await;
    let second = app.create_vendor("V-LIST-B").await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let done = app
        .create_order(first_id, "PO-A1", "2024-01-01", "2024-01-10")
        .await;
    app.create_order(first_id, "PO-A2", "2024-01-02", "2024-01-10")
        .await;
    app.create_order(second_id, "PO-B1", "2024-01-03", "2024-01-10")
        .await;
    complete(&app, &done, json!({})).await;

    let all = app
        .call(Method::GET, "/api/v1/purchase-orders", None, StatusCode::OK)
        .await;
    assert_eq!(all["data"]["total"], 3);

    let by_vendor = app
        .call(
            Method::GET,
            &format!("/api/v1/purchase-orders?vendor_id={}", first_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(by_vendor["data"]["total"], 2);

    let completed = app
        .call(
            Method::GET,
            &format!("/api/v1/purchase-orders?vendor_id={}&status=completed", first_id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(completed["data"]["total"], 1);
    assert_eq!(completed["data"]["items"][0]["po_number"], "PO-A1");

    app.call(
        Method::GET,
        "/api/v1/purchase-orders?status=shipped",
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();

    for (method, uri) in [
        (Method::GET, format!("/api/v1/purchase-orders/{}", id)),
        (Method::DELETE, format!("/api/v1/purchase-orders/{}", id)),
        (Method::POST, format!("/api/v1/purchase-orders/{}/acknowledge", id)),
        (Method::POST, format!("/api/v1/purchase-orders/{}/cancel", id)),
    ] {
        app.call(method, &uri, None, StatusCode::NOT_FOUND).await;
    }
}

#[tokio::test]
async fn malformed_path_and_query_values_return_json_errors() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/purchase-orders/not-a-uuid",
        "/api/v1/purchase-orders?status=shipped",
        "/api/v1/vendors/not-a-uuid",
        "/api/v1/vendors/not-a-uuid/performance",
        "/api/v1/vendors/not-a-uuid/performance/history",
    ] {
        let body = app.call(Method::GET, uri, None, StatusCode::BAD_REQUEST).await;
        assert_eq!(body["error"], "Bad Request", "{}", uri);
        assert!(body["message"].is_string(), "{}", uri);
        assert!(body["request_id"].is_string(), "{}", uri);
    }

    let body = app
        .call(
            Method::POST,
            "/api/v1/purchase-orders/not-a-uuid/complete",
            Some(json!({})),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn repeated_recompute_keeps_metrics_and_bumps_version() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-RECOMPUTE").await;
    let vendor_id = vendor["id"].as_str().unwrap();
    let order = app
        .create_order(vendor_id, "PO-RC1", "2024-01-01", "2024-01-10")
        .await;
    app.create_order(vendor_id, "PO-RC2", "2024-01-01", "2024-01-10")
        .await;
    complete(
        &app,
        &order,
        json!({ "actual_delivery_date": "2024-01-08", "quality_rating": 3.5 }),
    )
    .await;

    let uri = format!("/api/v1/vendors/{}/performance/recompute", vendor_id);
    let first = app.call(Method::POST, &uri, None, StatusCode::OK).await["data"].clone();
    let second = app.call(Method::POST, &uri, None, StatusCode::OK).await["data"].clone();

    for metric in [
        "on_time_delivery_rate",
        "quality_rating_average",
        "average_response_time",
        "fulfilment_rate",
    ] {
        assert_eq!(first[metric], second[metric], "{}", metric);
    }
    assert_eq!(first["fulfilment_rate"], 0.5);
    assert_eq!(
        second["metrics_version"].as_i64().unwrap(),
        first["metrics_version"].as_i64().unwrap() + 1
    );
    assert_eq!(history_total(&app, vendor_id).await, 5);
}

#[tokio::test]
async fn blank_po_number_is_rejected() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("V-BLANK").await;

    let body = app
        .call(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "po_number": "   ",
                "vendor_id": vendor["id"],
                "expected_delivery_date": "2024-01-10",
                "items": [{ "description": "Rivets", "quantity": 5 }],
                "quantity": 5,
            })),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["fields"][0]["field"], "po_number");

    let order = app
        .create_order(vendor["id"].as_str().unwrap(), "PO-KEEP", "2024-01-01", "2024-01-10")
        .await;
    app.call(
        Method::PUT,
        &format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap()),
        Some(json!({ "po_number": "\t" })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}
