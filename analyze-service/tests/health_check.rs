//! Integration tests for the ambient endpoints.

mod common;

use common::{TestApp, TEST_API_KEY};
use reqwest::StatusCode;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::spawn("http://127.0.0.1:9/v1beta", Some(TEST_API_KEY)).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "analyze-service");
    assert_eq!(body["credential_configured"], true);
}

#[tokio::test]
async fn health_check_reports_missing_credential() {
    let app = TestApp::spawn("http://127.0.0.1:9/v1beta", None).await;

    let body: serde_json::Value = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(body["credential_configured"], false);
}

#[tokio::test]
async fn metrics_endpoint_responds() {
    let app = TestApp::spawn("http://127.0.0.1:9/v1beta", None).await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}
