//! HTTP-level tests driving the router in-process

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use lendhood_server::{
    api::create_router,
    clock::FixedClock,
    models::user::UserClaims,
    repository::{MemoryMembership, MemoryStore},
    services::Services,
    AppConfig, AppState,
};

const OWNER: i32 = 1;
const BORROWER: i32 = 2;
const HOOD: i32 = 7;

struct TestApp {
    router: Router,
    secret: String,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let secret = config.auth.jwt_secret.clone();

        let membership = Arc::new(MemoryMembership::new());
        membership.add_member(OWNER, HOOD);
        membership.add_member(BORROWER, HOOD);
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date"),
        ));
        let services = Services::new(Arc::new(MemoryStore::new()), membership, clock);

        let router = create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        });
        Self { router, secret }
    }

    fn token(&self, user_id: i32) -> String {
        UserClaims::new(user_id, 1)
            .create_token(&self.secret)
            .expect("token")
    }

    async fn send(&self, method: Method, uri: &str, user: Option<i32>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user_id)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn create_item(&self) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/items",
                Some(OWNER),
                Some(json!({
                    "name": "Ladder",
                    "category": "tools",
                    "neighborhood_id": HOOD
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("item id")
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/loans", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/nothing-here", Some(OWNER), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "route_not_found");
}

#[tokio::test]
async fn test_non_member_cannot_list_item() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/items",
            Some(99),
            Some(json!({ "name": "Drill", "neighborhood_id": HOOD })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_member_of_neighborhood");
}

#[tokio::test]
async fn test_borrow_flow() {
    let app = TestApp::new();
    let item_id = app.create_item().await;

    let (status, window) = app
        .send(
            Method::POST,
            &format!("/api/v1/items/{item_id}/availabilities"),
            Some(OWNER),
            Some(json!({ "start_date": "2024-06-01", "end_date": "2024-06-10" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{window}");
    assert_eq!(window["status"], "available");

    let (status, check) = app
        .send(
            Method::GET,
            &format!("/api/v1/items/{item_id}/availability-check?start_date=2024-06-03&end_date=2024-06-05"),
            Some(BORROWER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["available"], true);

    let (status, request) = app
        .send(
            Method::POST,
            "/api/v1/loan-requests",
            Some(BORROWER),
            Some(json!({
                "item_id": item_id,
                "start_date": "2024-06-03",
                "end_date": "2024-06-05",
                "message": "Gutter cleaning"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{request}");
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_i64().expect("request id");

    let (status, body) = app
        .send(Method::POST, &format!("/api/v1/loan-requests/{request_id}/accept"), Some(BORROWER), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, loan) = app
        .send(Method::POST, &format!("/api/v1/loan-requests/{request_id}/accept"), Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{loan}");
    assert_eq!(loan["status"], "active");
    let loan_id = loan["id"].as_i64().expect("loan id");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/loan-requests",
            Some(BORROWER),
            Some(json!({ "item_id": item_id, "start_date": "2024-06-04", "end_date": "2024-06-06" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "item_not_available");

    let (status, slots) = app
        .send(Method::GET, &format!("/api/v1/loan-requests/{request_id}/slots"), Some(BORROWER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slots[0]["status"], "occupied");

    let (status, loans) = app.send(Method::GET, "/api/v1/loans?status=active", Some(OWNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loans.as_array().map(Vec::len), Some(1));

    // no body: the return date defaults to today, which is before the start
    let (status, body) = app
        .send(Method::POST, &format!("/api/v1/loans/{loan_id}/return"), Some(BORROWER), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_dates");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/loans/{loan_id}/return"),
            Some(BORROWER),
            Some(json!({ "actual_return_date": "2024-13-45" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");

    let (status, loan) = app
        .send(Method::GET, &format!("/api/v1/loans/{loan_id}"), Some(BORROWER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loan["status"], "active");

    let (status, loan) = app
        .send(
            Method::POST,
            &format!("/api/v1/loans/{loan_id}/return"),
            Some(BORROWER),
            Some(json!({ "actual_return_date": "2024-06-05" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{loan}");
    assert_eq!(loan["status"], "returned");
    assert_eq!(loan["actual_return_date"], "2024-06-05");

    let (status, body) = app
        .send(Method::POST, &format!("/api/v1/loans/{loan_id}/return"), Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "loan_not_active");
}

#[tokio::test]
async fn test_slot_endpoints() {
    let app = TestApp::new();
    let item_id = app.create_item().await;
    let (_, window) = app
        .send(
            Method::POST,
            &format!("/api/v1/items/{item_id}/availabilities"),
            Some(OWNER),
            Some(json!({ "start_date": "2024-06-01", "end_date": "2024-06-10" })),
        )
        .await;
    let window_id = window["id"].as_i64().expect("window id");

    let (status, slot) = app
        .send(
            Method::POST,
            &format!("/api/v1/availabilities/{window_id}/slots"),
            Some(OWNER),
            Some(json!({ "start_date": "2024-06-02", "end_date": "2024-06-04" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{slot}");
    assert_eq!(slot["status"], "reserved");
    let slot_id = slot["id"].as_i64().expect("slot id");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/availabilities/{window_id}/slots"),
            Some(OWNER),
            Some(json!({ "start_date": "2024-06-03", "end_date": "2024-06-06" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "slot_overlap");

    let (status, conflicts) = app
        .send(
            Method::GET,
            &format!("/api/v1/availabilities/{window_id}/slots/conflicts?start_date=2024-06-03&end_date=2024-06-06"),
            Some(OWNER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conflicts[0]["id"].as_i64(), Some(slot_id));

    let (status, slot) = app
        .send(Method::POST, &format!("/api/v1/slots/{slot_id}/cancel"), Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot["status"], "available");

    let (status, available) = app
        .send(Method::GET, &format!("/api/v1/availabilities/{window_id}/slots/available"), Some(BORROWER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available.as_array().map(Vec::len), Some(1));

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/slots/{slot_id}"), Some(OWNER), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
