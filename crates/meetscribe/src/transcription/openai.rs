//! OpenAI Whisper speech-to-text adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use secrecy::{ExposeSecret, SecretString};

use crate::artifact::Artifact;
use crate::http::{create_http_client, sanitize_error_body};

use super::error::TranscriptionError;
use super::provider::SpeechToTextProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MODEL: &str = "whisper-1";
const PROVIDER: &str = "openai-whisper";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const CONTEXT_PROMPT: &str =
    "This is a work meeting. Transcribe all of the content clearly and accurately.";

pub struct WhisperProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl WhisperProvider {
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Result<Self, TranscriptionError> {
        let client = create_http_client(REQUEST_TIMEOUT).map_err(|e| TranscriptionError::Request {
            provider: PROVIDER,
            message: format!("failed to create HTTP client: {}", e),
        })?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[async_trait]
impl SpeechToTextProvider for WhisperProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn transcribe(
        &self,
        artifact: &Artifact,
        language_hint: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        let url = format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'));

        let file_part = multipart::Part::bytes(artifact.bytes().to_vec())
            .file_name(artifact.filename().to_string())
            .mime_str(artifact.media_type())
            .map_err(|e| TranscriptionError::Request {
                provider: PROVIDER,
                message: format!("mime: {}", e),
            })?;

        let mut form = multipart::Form::new()
            .text("model", MODEL)
            .text("response_format", "text")
            .text("temperature", "0")
            .text("prompt", CONTEXT_PROMPT)
            .part("file", file_part);
        if let Some(language) = language_hint {
            form = form.text("language", language.to_string());
        }

        tracing::debug!(bytes = artifact.byte_size(), "Sending audio to OpenAI Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: sanitize_error_body(&body),
            });
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        tracing::info!(chars = transcript.len(), "Whisper transcription completed");

        Ok(transcript.trim().to_string())
    }
}
