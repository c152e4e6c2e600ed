#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use gymtrack_api::database::{DocumentStore, MemoryStore};
use gymtrack_api::services::{BodyMetricsService, UsersService};
use gymtrack_api::{app, AppState};

/// Full application router over an in-memory store; no external database.
pub async fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    store
        .ensure_collection(&UsersService::collection_spec())
        .await
        .unwrap();
    store
        .ensure_collection(&BodyMetricsService::collection_spec())
        .await
        .unwrap();
    app(AppState::new(store))
}

/// Drive one request through the router and decode the JSON body.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registration payload that passes every user validation rule. Male so
/// that the metrics flow computes an in-bounds body fat percentage.
pub fn sample_user(email: &str) -> Value {
    json!({
        "firstName": "Diego",
        "lastName": "Costa",
        "email": email,
        "birthDay": "1990-04-12",
        "height": 178,
        "gender": "male",
        "password": "secret123"
    })
}

/// Raw measurements that pass every metrics validation rule.
pub fn sample_measurements() -> Value {
    json!({
        "weight": 70.0,
        "armsCircumference": [34.0, 34.5],
        "forearmsCircumference": [28.0, 28.2],
        "wristsCircumference": [16.5, 16.4],
        "legsUpCircumference": [55.0, 55.5],
        "calfsCircumference": [37.0, 37.2],
        "waistCircumference": 82.0,
        "hipCircumference": 95.0
    })
}

pub async fn register(app: &Router, email: &str) -> Value {
    let (status, body) = request(app, "POST", "/api/users", None, Some(sample_user(email))).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body
}

pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

pub async fn register_and_login(app: &Router, email: &str) -> (Value, String) {
    let user = register(app, email).await;
    let token = login(app, email, "secret123").await;
    (user, token)
}
