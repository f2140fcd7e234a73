#![allow(dead_code)]

use analyze_service::config::AnalyzeConfig;
use analyze_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_MODEL: &str = "gemini-2.5-flash";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service on a random port, pointed at `api_base` for Gemini.
    pub async fn spawn(api_base: &str, api_key: Option<&str>) -> Self {
        let mut vars = HashMap::new();
        vars.insert("GEMINI_API_BASE".to_string(), api_base.to_string());
        vars.insert("GEMINI_MODEL".to_string(), TEST_MODEL.to_string());
        if let Some(key) = api_key {
            vars.insert("GEMINI_API_KEY".to_string(), key.to_string());
        }

        let common = CoreConfig {
            port: 0, // Random port for testing
            log_level: "info".to_string(),
        };
        let config = AnalyzeConfig::from_lookup(common, |key| vars.get(key).cloned())
            .expect("Failed to build configuration");

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, client }
    }

    pub async fn post_analyze(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/analyze", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// Gemini path for the test model under the mock server's `/v1beta` base.
pub fn generate_content_path() -> String {
    format!("/v1beta/models/{}:generateContent", TEST_MODEL)
}
