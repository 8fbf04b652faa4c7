//! Generation-service abstractions.
//!
//! This module defines the trait the engine consumes for text
//! generation. Prompt wording lives in [`crate::prompts`]; the provider
//! only moves bytes. A Gemini implementation is available behind the
//! `gemini` feature.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use quill_core::ModelId;

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, GEMINI_API_KEY_ENV};

/// Errors from generation backends.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Authentication failed")]
    Auth,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,
}

/// Capability the engine consumes to obtain suggestions.
///
/// This is the ONLY place where generation calls leave the process.
/// The engine treats the backend as opaque: it lists model identifiers,
/// and it turns a prompt into a string.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Identifiers of the models the backend currently offers.
    async fn list_models(&self) -> Result<Vec<ModelId>, GenerationError>;

    /// Generate text for a prompt with the given model.
    async fn generate(&self, model: &ModelId, prompt: &str) -> Result<String, GenerationError>;

    /// Backend name, for logs.
    fn name(&self) -> &str;
}
