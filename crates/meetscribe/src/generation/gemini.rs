//! Gemini `generateContent` adapter.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::http::{create_http_client, sanitize_error_body};

use super::provider::{GenerationParams, ProviderError, ProviderErrorKind, TextGenerationProvider};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfigBody,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// The client timeout is set slightly above `call_timeout` so the
    /// Generator's own deadline fires first.
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        call_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = create_http_client(call_timeout + Duration::from_secs(5)).map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::Unavailable,
                format!("failed to create HTTP client: {}", e),
            )
        })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        debug!(
            "Gemini provider: model={} base_url={}",
            model,
            crate::sanitize::redact_url(&base_url)
        );
        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Maps an HTTP failure to a provider error kind.
fn classify_status(status: StatusCode, body: &str) -> ProviderErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            ProviderErrorKind::Overloaded
        }
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => ProviderErrorKind::Timeout,
        _ => ProviderErrorKind::from_message(body),
    }
}

fn extract_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl TextGenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfigBody {
                temperature: params.temperature,
                top_k: params.top_k,
                top_p: params.top_p,
                max_output_tokens: params.max_output_tokens,
            },
        };

        debug!("Gemini request: model={} prompt_chars={}", self.model, prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    ProviderErrorKind::Timeout
                } else {
                    ProviderErrorKind::Unavailable
                };
                ProviderError::new(kind, format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                classify_status(status, &text),
                format!("Gemini API error {}: {}", status, sanitize_error_body(&text)),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                format!("invalid response body: {}", e),
            )
        })?;

        extract_text(parsed).ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::InvalidResponse,
                "response contained no candidate text",
            )
        })
    }
}
