//! Label analysis relay.
//!
//! `POST /api/analyze` with `{ "base64Image": "..." }`. The image goes to the
//! vision provider together with the medication extraction prompt and the
//! provider's JSON body comes back unchanged. Every failure is answered with
//! `{ "error": "..." }` and logged once.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use service_core::error::AppError;

use crate::services::metrics::record_analyze_outcome;
use crate::services::prompts::MEDICATION_EXTRACTION_PROMPT;
use crate::services::InlineImage;
use crate::startup::AppState;

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed (POST only)";
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Server Error: GEMINI_API_KEY is not configured";
pub const MISSING_IMAGE_MESSAGE: &str = "No image data was provided";

/// Sent for every image regardless of its actual encoding.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Inbound request body. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "base64Image", default)]
    pub base64_image: Option<Value>,
}

impl AnalyzeRequest {
    /// The image payload. Absent and falsy values (`null`, `false`, `0`,
    /// `""`) all mean no image was sent.
    pub fn image_data(self) -> Result<String, AppError> {
        match self.base64_image {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Err(missing_image()),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(missing_image()),
            Some(Value::String(data)) if data.is_empty() => Err(missing_image()),
            Some(Value::String(data)) => Ok(data),
            Some(_) => Err(AppError::BadRequest(
                "base64Image must be a base64-encoded string".to_string(),
            )),
        }
    }
}

fn missing_image() -> AppError {
    AppError::BadRequest(MISSING_IMAGE_MESSAGE.to_string())
}

pub async fn analyze(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = if method == Method::POST {
        relay(&state, body).await
    } else {
        Err(AppError::MethodNotAllowed(
            METHOD_NOT_ALLOWED_MESSAGE.to_string(),
        ))
    };

    match result {
        Ok(payload) => {
            record_analyze_outcome("success");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                payload,
            )
                .into_response()
        }
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(status = status.as_u16(), error = %err.message(), "Backend error");
            } else {
                tracing::warn!(status = status.as_u16(), error = %err.message(), "Rejected analyze request");
            }
            record_analyze_outcome(outcome_label(&err));
            err.into_response()
        }
    }
}

async fn relay(state: &AppState, body: Result<Bytes, BytesRejection>) -> Result<Bytes, AppError> {
    // Checked before the body so a misconfigured deployment never builds an
    // outbound request.
    let api_key = state
        .config
        .gemini
        .api_key()
        .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!(MISSING_CREDENTIAL_MESSAGE)))?;

    let body = body.map_err(body_rejection)?;
    let request = parse_request(&body)?;

    let image = request.image_data()?;

    let payload = state
        .provider
        .analyze(
            api_key,
            MEDICATION_EXTRACTION_PROMPT,
            InlineImage {
                mime_type: IMAGE_MIME_TYPE,
                data: &image,
            },
        )
        .await?;

    Ok(payload)
}

/// An empty body is treated as a request without an image.
fn parse_request(body: &[u8]) -> Result<AnalyzeRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalyzeRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn body_rejection(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        AppError::BadRequest(rejection.body_text())
    }
}

fn outcome_label(err: &AppError) -> &'static str {
    match err {
        AppError::MethodNotAllowed(_) => "method_not_allowed",
        AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => "client_error",
        AppError::ConfigError(_) => "config_error",
        AppError::BadGateway(_) => "upstream_error",
        AppError::InternalError(_) => "internal_error",
    }
}
