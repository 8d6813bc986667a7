//! Router tests that run without a database.
//!
//! The state is wired to a disconnected pool, so requests rejected before
//! any query run end to end, and requests that reach the repositories
//! surface as repository errors.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

use kopa_accounting::AccountingClient;
use kopa_api::{AppState, create_router};
use kopa_core::loan::HookChain;

fn app() -> Router {
    let accounting = AccountingClient::with_client(
        reqwest::Client::new(),
        "http://127.0.0.1:9".to_string(),
        None,
    );
    create_router(AppState::new(
        DatabaseConnection::Disconnected,
        accounting,
        HookChain::new(),
    ))
}

async fn send(method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("Content-Type", "application/json");
    }
    let request = request
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (status, json) = send(Method::GET, "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (status, _) = send(Method::GET, "/api/v1/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_status_filter_is_rejected() {
    let (status, json) = send(Method::GET, "/api/v1/loans?status=LIMBO", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert!(json["message"].as_str().unwrap().contains("LIMBO"));
}

#[tokio::test]
async fn test_malformed_loan_id_is_rejected() {
    let (status, _) = send(Method::GET, "/api/v1/loans/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_loan_type_never_reaches_storage() {
    let body = r#"{
        "name": "  ",
        "classification": "CASH",
        "min_amount": "100",
        "max_amount": "1000"
    }"#;
    let (status, json) = send(Method::POST, "/api/v1/loan-types", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_fee_attribute_is_rejected() {
    let body = r#"{
        "name": "Biashara",
        "classification": "CASH",
        "attributes": [{
            "name": "Insurance",
            "value": "100",
            "is_percentage": false,
            "charge_type": "ONE_TIME",
            "one_time_timing": "AFTER_PERIOD"
        }]
    }"#;
    let (status, json) = send(Method::POST, "/api/v1/loan-types", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "MALFORMED_FEE_ATTRIBUTE");
}

#[tokio::test]
async fn test_storage_failure_is_reported() {
    let (status, json) = send(
        Method::GET,
        "/api/v1/loans/0190f5b2-9d1e-7c4a-8a51-3b0e2c6f1a77",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "REPOSITORY_ERROR");
}

#[tokio::test]
async fn test_syntax_error_in_body_is_rejected() {
    let (status, _) = send(Method::POST, "/api/v1/loans", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
