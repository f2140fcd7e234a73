//! Gemini provider implementation.
//!
//! Calls `models/{model}:generateContent` once per image. The credential is
//! passed per call as the `key` query parameter; the success body is returned
//! as received.

use super::{InlineImage, ProviderError, VisionProvider};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;

use crate::config::GeminiSettings;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub model: String,
}

impl From<&GeminiSettings> for GeminiConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            api_base: settings.api_base.clone(),
            model: settings.model.clone(),
        }
    }
}

/// Gemini vision provider.
#[derive(Clone)]
pub struct GeminiVisionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVisionProvider {
    /// The client has no request timeout of its own; the network stack's
    /// limits apply.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the API URL for the given method. The key is appended separately.
    fn api_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_base, self.config.model, method)
    }
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    async fn analyze(
        &self,
        api_key: &str,
        prompt: &str,
        image: InlineImage<'_>,
    ) -> Result<Bytes, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type,
                            data: image.data,
                        },
                    },
                ],
            }],
        };

        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            image_len = image.data.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .traced_post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: upstream_error_message(status, &body),
            });
        }

        serde_json::from_slice::<serde::de::IgnoredAny>(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(body)
    }
}

/// Message carried by a failed call: `error.message` from Gemini's error
/// envelope, else the status text.
fn upstream_error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(String::from)
                .unwrap_or_else(|| status.as_str().to_string())
        })
}

/// Flatten a transport error and its causes into one line. The URL is
/// stripped because it carries the credential.
fn network_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Network(format!("{:#}", anyhow::Error::new(err.without_url())))
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}
