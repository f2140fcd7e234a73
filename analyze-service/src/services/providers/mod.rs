//! Inference provider abstraction.
//!
//! The handler talks to a [`VisionProvider`]; [`gemini::GeminiVisionProvider`]
//! is the production backend.

pub mod gemini;

use async_trait::async_trait;
use bytes::Bytes;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Non-success status. `message` is the provider's own error message when
    /// it sent one, otherwise the HTTP status text.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("Invalid response from inference service: {0}")]
    InvalidResponse(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Upstream { message, .. } => AppError::BadGateway(message),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

/// Base64 image payload as received from the client.
#[derive(Debug, Clone, Copy)]
pub struct InlineImage<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

/// Sends one prompt + image to a multimodal model.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Returns the provider's raw JSON response body on success.
    async fn analyze(
        &self,
        api_key: &str,
        prompt: &str,
        image: InlineImage<'_>,
    ) -> Result<Bytes, ProviderError>;
}
