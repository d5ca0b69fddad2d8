//! Text-generation capability consumed by the [`Generator`](super::Generator).

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling parameters forwarded to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

/// Structured failure kind assigned once, where the raw provider error is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Rate limit, quota or capacity exhaustion. Retried with backoff.
    Overloaded,
    /// The call exceeded its deadline. Retried with backoff.
    Timeout,
    /// No credentials or the endpoint could not be reached.
    Unavailable,
    /// The provider answered but without usable text.
    InvalidResponse,
    Other,
}

impl ProviderErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderErrorKind::Overloaded | ProviderErrorKind::Timeout)
    }

    /// Best-effort classification of an untyped provider message.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if ["overloaded", "rate limit", "rate-limit", "quota", "resource_exhausted", "too many requests"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            ProviderErrorKind::Overloaded
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Other
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderErrorKind::Overloaded => "overloaded",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::InvalidResponse => "invalid response",
            ProviderErrorKind::Other => "error",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone)]
#[error("provider {kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an error whose kind is inferred from the message text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ProviderErrorKind::from_message(&message),
            message,
        }
    }
}

#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, ProviderError>;
}

/// Provider used when no generation credentials are configured. Every call
/// fails as `Unavailable`, which routes the caller to the degraded fallback.
pub struct UnconfiguredProvider;

#[async_trait]
impl TextGenerationProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::new(
            ProviderErrorKind::Unavailable,
            "no text generation provider is configured",
        ))
    }
}
