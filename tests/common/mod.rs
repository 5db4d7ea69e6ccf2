#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

use recipebox::db::schema::setup_schema;
use recipebox::server::config::ServerConfig;
use recipebox::web::create_axum_router;

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    // Held so the upload directory outlives the test.
    pub media_root: tempfile::TempDir,
}

/// Builds a full application router backed by a fresh in-memory SQLite
/// database. One connection only: every pooled connection would otherwise
/// get its own empty in-memory database.
pub async fn spawn_app() -> TestApp {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1);
    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory sqlite");
    setup_schema(&db).await.expect("failed to set up schema");

    let media_root = tempfile::tempdir().expect("failed to create media dir");
    let config = Arc::new(ServerConfig {
        jwt_secret: "test-secret".to_string(),
        media_root: media_root.path().to_string_lossy().into_owned(),
        bind_addr: "127.0.0.1:0".to_string(),
    });

    TestApp {
        router: create_axum_router(db.clone(), config),
        db,
        media_root,
    }
}

/// Sends a JSON request through the router and returns status + parsed body.
/// Empty response bodies come back as `Value::Null`.
pub async fn request_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers a user and returns a bearer token for it.
pub async fn register_and_token(router: &Router, email: &str, password: &str) -> String {
    let (status, _) = request_json(
        router,
        "POST",
        "/api/user/create",
        None,
        Some(json!({ "email": email, "password": password, "name": "test user" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request_json(
        router,
        "POST",
        "/api/user/token",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token missing").to_string()
}

pub async fn create_tag(router: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = request_json(
        router,
        "POST",
        "/api/recipe/tags/",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

pub async fn create_ingredient(router: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = request_json(
        router,
        "POST",
        "/api/recipe/ingredients/",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

pub async fn create_recipe(router: &Router, token: &str, payload: Value) -> Value {
    let (status, body) = request_json(
        router,
        "POST",
        "/api/recipe/recipes/",
        Some(token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

pub fn sample_recipe_payload(title: &str) -> Value {
    json!({
        "title": title,
        "timeMinutes": 16,
        "price": 17.0
    })
}
