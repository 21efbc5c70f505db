//! Integration tests for the LazyESP Web API.
//!
//! These tests require the `web` feature to be enabled:
//! ```bash
//! cargo test --features web web_api
//! ```

#![cfg(feature = "web")]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lazyesp::models::Widget;
use lazyesp::web::{create_router, AppState};

mod fixtures;
use fixtures::{test_compiler, test_project_pure};

fn test_app() -> axum::Router {
    create_router(AppState::with_compiler(test_compiler()))
}

/// Helper to make a GET request and get the response body as JSON.
async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

/// Helper to make a POST request with a JSON body.
async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    (status, json)
}

// ============================================================================
// Health & Profiles
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_list_profiles() {
    let app = test_app();
    let (status, body) = get_json(&app, "/api/profiles").await;

    assert_eq!(status, StatusCode::OK);
    let profiles = body["profiles"].as_array().unwrap();
    let e1001 = profiles
        .iter()
        .find(|p| p["id"] == "reterminal_e1001")
        .expect("built-in profile listed");
    assert_eq!(e1001["epaper"], true);
    assert_eq!(e1001["source"], "builtin");
}

// ============================================================================
// Compile & Validate
// ============================================================================

#[tokio::test]
async fn test_compile_project() {
    let app = test_app();
    let project = serde_json::to_value(test_project_pure()).unwrap();
    let (status, body) = post_json(&app, "/api/compile", project).await;

    assert_eq!(status, StatusCode::OK);
    let document = body["document"].as_str().unwrap();
    assert!(document.contains("# project: device:reterminal_e1001"));
    assert!(document.contains("// widget:text id:title"));
    assert!(!document.contains("# Generated:"));
    assert_eq!(body["profile_id"], "reterminal_e1001");
    assert_eq!(body["toolkit_mode"], false);
    assert!(body["diagnostics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_compile_matches_library_output() {
    let app = test_app();
    let project = test_project_pure();
    let expected = test_compiler().compile(&project).document;

    let (_, body) = post_json(&app, "/api/compile", serde_json::to_value(&project).unwrap()).await;
    assert_eq!(body["document"].as_str().unwrap(), expected);
}

#[tokio::test]
async fn test_compile_rejects_malformed_body() {
    let app = test_app();
    let (status, _) = post_json(&app, "/api/compile", json!({ "pages": "nope" })).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_validate_reports_duplicates() {
    let app = test_app();
    let mut project = test_project_pure();
    project.pages[1]
        .widgets
        .push(Widget::new("title", "text", 0, 0, 10, 10));

    let (status, body) =
        post_json(&app, "/api/validate", serde_json::to_value(&project).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["widget"] == "title"));
}

#[tokio::test]
async fn test_validate_clean_project() {
    let app = test_app();
    let project = serde_json::to_value(test_project_pure()).unwrap();
    let (status, body) = post_json(&app, "/api/validate", project).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert!(body["errors"].as_array().unwrap().is_empty());
}

// ============================================================================
// Import
// ============================================================================

#[tokio::test]
async fn test_import_generated_document() {
    let app = test_app();
    let document = test_compiler().compile(&test_project_pure()).document;
    let (status, body) = post_json(&app, "/api/import", json!({ "document": document })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_settings"], true);
    assert_eq!(body["project"]["name"], "Hallway");
    assert_eq!(body["project"]["pages"].as_array().unwrap().len(), 2);
    assert!(body["skipped"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_import_empty_document() {
    let app = test_app();
    let (status, body) = post_json(&app, "/api/import", json!({ "document": "esphome:\n" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_import_rejects_runaway_page_index() {
    let app = test_app();
    let document = "# project: device:reterminal_e1001\n    if (currentPage == 3000000) {\n";
    let (status, _) = post_json(&app, "/api/import", json!({ "document": document })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
