mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

#[tokio::test]
async fn create_vendor_starts_with_zeroed_metrics() {
    let app = TestApp::new().await;

    let vendor = app.create_vendor("ACME-001").await;

    assert_eq!(vendor["vendor_code"], "ACME-001");
    assert_eq!(vendor["name"], "Vendor ACME-001");
    assert_eq!(vendor["on_time_delivery_rate"], 0.0);
    assert_eq!(vendor["quality_rating_average"], 0.0);
    assert_eq!(vendor["average_response_time"], 0.0);
    assert_eq!(vendor["fulfilment_rate"], 0.0);
    assert_eq!(vendor["metrics_version"], 0);
    assert!(vendor["id"].as_str().and_then(|id| id.parse::<Uuid>().ok()).is_some());
}

#[tokio::test]
async fn create_vendor_envelope_carries_request_meta() {
    let app = TestApp::new().await;

    let body = app
        .call(
            Method::POST,
            "/api/v1/vendors",
            Some(json!({
                "name": "Globex",
                "contact_details": "sales@globex.test",
                "address": "42 Main St",
                "vendor_code": "GLOBEX",
            })),
            StatusCode::CREATED,
        )
        .await;

    assert_eq!(body["success"], true);
    assert!(body["meta"]["request_id"].is_string());
    assert!(body["meta"]["timestamp"].is_string());
}

#[tokio::test]
async fn duplicate_vendor_code_is_a_conflict() {
    let app = TestApp::new().await;
    app.create_vendor("DUP-1").await;

    let body = app
        .call(
            Method::POST,
            "/api/v1/vendors",
            Some(json!({
                "name": "Someone Else",
                "contact_details": "x@example.com",
                "address": "Elsewhere",
                "vendor_code": "DUP-1",
            })),
            StatusCode::CONFLICT,
        )
        .await;

    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn invalid_vendor_payload_lists_failing_fields() {
    let app = TestApp::new().await;

    let body = app
        .call(
            Method::POST,
            "/api/v1/vendors",
            Some(json!({
                "name": "",
                "contact_details": "x@example.com",
                "address": "",
                "vendor_code": "OK-1",
            })),
            StatusCode::BAD_REQUEST,
        )
        .await;

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("field errors")
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["address", "name"]);
}

#[tokio::test]
async fn metric_fields_cannot_be_written_by_clients() {
    let app = TestApp::new().await;

    app.call(
        Method::POST,
        "/api/v1/vendors",
        Some(json!({
            "name": "Cheater Inc",
            "contact_details": "c@example.com",
            "address": "1 Fake St",
            "vendor_code": "CHEAT",
            "on_time_delivery_rate": 1.0,
        })),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let vendor = app.create_vendor("HONEST").await;
    let id = vendor["id"].as_str().unwrap();
    app.call(
        Method::PUT,
        &format!("/api/v1/vendors/{}", id),
        Some(json!({ "fulfilment_rate": 1.0 })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn get_update_and_delete_vendor() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("CRUD-1").await;
    let id = vendor["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/vendors/{}", id);

    let fetched = app.call(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(fetched["data"]["id"], id.as_str());

    let updated = app
        .call(
            Method::PUT,
            &uri,
            Some(json!({ "name": "Renamed Vendor", "address": "2 New Road" })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["data"]["name"], "Renamed Vendor");
    assert_eq!(updated["data"]["address"], "2 New Road");
    assert_eq!(updated["data"]["vendor_code"], "CRUD-1");
    assert_eq!(updated["data"]["contact_details"], "orders@example.com");

    let response = app.request_authenticated(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.call(Method::GET, &uri, None, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn update_to_taken_vendor_code_conflicts() {
    let app = TestApp::new().await;
    app.create_vendor("TAKEN").await;
    let other = app.create_vendor("FREE").await;

    app.call(
        Method::PUT,
        &format!("/api/v1/vendors/{}", other["id"].as_str().unwrap()),
        Some(json!({ "vendor_code": "TAKEN" })),
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
async fn lookup_by_code() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("LOOKUP-9").await;

    let found = app
        .call(Method::GET, "/api/v1/vendors/by-code/LOOKUP-9", None, StatusCode::OK)
        .await;
    assert_eq!(found["data"]["id"], vendor["id"]);

    app.call(Method::GET, "/api/v1/vendors/by-code/NOPE", None, StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn unknown_vendor_is_not_found() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/vendors/{}", Uuid::new_v4());

    app.call(Method::GET, &uri, None, StatusCode::NOT_FOUND).await;
    app.call(
        Method::PUT,
        &uri,
        Some(json!({ "name": "Ghost" })),
        StatusCode::NOT_FOUND,
    )
    .await;
    app.call(Method::DELETE, &uri, None, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn list_vendors_paginates_by_name() {
    let app = TestApp::new().await;
    for code in ["C-3", "A-1", "B-2"] {
        app.create_vendor(code).await;
    }

    let page = app
        .call(
            Method::GET,
            "/api/v1/vendors?page=1&per_page=2",
            None,
            StatusCode::OK,
        )
        .await;
    let data = &page["data"];
    assert_eq!(data["total"], 3);
    assert_eq!(data["total_pages"], 2);
    let names: Vec<&str> = data["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Vendor A-1", "Vendor B-2"]);

    let second = app
        .call(
            Method::GET,
            "/api/v1/vendors?page=2&per_page=2",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(second["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_vendor_removes_its_orders() {
    let app = TestApp::new().await;
    let vendor = app.create_vendor("CASCADE").await;
    let vendor_id = vendor["id"].as_str().unwrap();
    let order = app
        .create_order(vendor_id, "PO-CASCADE-1", "2024-01-01", "2024-01-10")
        .await;

    app.call(
        Method::DELETE,
        &format!("/api/v1/vendors/{}", vendor_id),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;

    app.call(
        Method::GET,
        &format!("/api/v1/purchase-orders/{}", order["id"].as_str().unwrap()),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/vendors",
            Some(json!({ "name": 42 })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whitespace_only_text_fields_are_rejected() {
    let app = TestApp::new().await;

    let body = app
        .call(
            Method::POST,
            "/api/v1/vendors",
            Some(json!({
                "name": "  ",
                "contact_details": "ops@example.com",
                "address": "\t",
                "vendor_code": "   ",
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
    assert_eq!(fields, vec!["address", "name", "vendor_code"]);
    assert_eq!(body["fields"][0]["message"], "must not be blank");

    let vendor = app.create_vendor("TRIMMED").await;
    let uri = format!("/api/v1/vendors/{}", vendor["id"].as_str().unwrap());
    app.call(
        Method::PUT,
        &uri,
        Some(json!({ "vendor_code": " " })),
        StatusCode::BAD_REQUEST,
    )
    .await;
    let unchanged = app.call(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(unchanged["data"]["vendor_code"], "TRIMMED");
}
