#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tokio::{sync::mpsc, task::JoinHandle};
use tower::ServiceExt;
use uuid::Uuid;
use vendor_api::{
    auth::{hash_password, Role},
    build_router,
    config::AppConfig,
    db,
    entities::user,
    events::{self, EventSender},
    AppState,
};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// In-process application over a fresh in-memory SQLite database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    admin_token: String,
    _event_task: JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            8080,
            "development".to_string(),
        );

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("in-memory sqlite connection");
        db::run_migrations(&pool).await.expect("migrations apply");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));
        let admin_token = state
            .auth
            .issue_token("test-admin", Some("Test Admin".to_string()), None, Role::Admin)
            .expect("admin token")
            .access_token;
        let router = build_router(state.clone());

        Self {
            router,
            state,
            admin_token,
            _event_task: event_task,
        }
    }

    /// Bearer token for the default admin subject.
    pub fn token(&self) -> &str {
        &self.admin_token
    }

    /// Mints a token for an arbitrary role.
    pub fn token_for(&self, role: Role) -> String {
        self.state
            .auth
            .issue_token(&format!("test-{}", role), None, None, role)
            .expect("role token")
            .access_token
    }

    /// Inserts an active user directly, returning the stored row.
    pub async fn seed_user(&self, email: &str, password: &str, role: Role) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            name: Set("Seeded User".to_string()),
            password_hash: Set(hash_password(password).expect("hash password")),
            role: Set(role.as_str().to_string()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed user")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for admin-authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Sends an authenticated request and decodes the JSON body, asserting the status.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request_authenticated(method.clone(), uri, body).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, expected, "{} {} returned {}", method, uri, json);
        json
    }

    /// Creates a vendor through the API and returns its `data` object.
    pub async fn create_vendor(&self, code: &str) -> Value {
        let body = json!({
            "name": format!("Vendor {}", code),
            "contact_details": "orders@example.com",
            "address": "1 Supply Way, Springfield",
            "vendor_code": code,
        });
        self.call(Method::POST, "/api/v1/vendors", Some(body), StatusCode::CREATED)
            .await["data"]
            .clone()
    }

    /// Creates a purchase order through the API and returns its `data` object.
    pub async fn create_order(
        &self,
        vendor_id: &str,
        po_number: &str,
        issue_date: &str,
        expected_delivery_date: &str,
    ) -> Value {
        let body = json!({
            "po_number": po_number,
            "vendor_id": vendor_id,
            "issue_date": issue_date,
            "order_date": issue_date,
            "expected_delivery_date": expected_delivery_date,
            "items": [{ "description": "Steel bolts", "quantity": 10 }],
            "quantity": 10,
        });
        self.call(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(body),
            StatusCode::CREATED,
        )
        .await["data"]
            .clone()
    }
}

/// Decodes a response body as JSON; an empty body becomes `null`.
pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
