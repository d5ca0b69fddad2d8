//! AssemblyAI speech-to-text adapter: upload, create a transcript, then poll.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::http::{create_http_client, sanitize_error_body};

use super::error::TranscriptionError;
use super::provider::SpeechToTextProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";
const PROVIDER: &str = "assemblyai";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Twenty minutes at the default interval.
const DEFAULT_MAX_POLLS: u32 = 400;

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    language_detection: bool,
    speaker_labels: bool,
}

#[derive(Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct AssemblyAiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AssemblyAiProvider {
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Result<Self, TranscriptionError> {
        let client = create_http_client(REQUEST_TIMEOUT).map_err(|e| TranscriptionError::Request {
            provider: PROVIDER,
            message: format!("failed to create HTTP client: {}", e),
        })?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TranscriptionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TranscriptionError::Status {
            provider: PROVIDER,
            status: status.as_u16(),
            body: sanitize_error_body(&body),
        })
    }

    fn request_error(e: reqwest::Error) -> TranscriptionError {
        TranscriptionError::Request {
            provider: PROVIDER,
            message: e.to_string(),
        }
    }

    fn invalid(e: reqwest::Error) -> TranscriptionError {
        TranscriptionError::InvalidResponse {
            provider: PROVIDER,
            message: e.to_string(),
        }
    }

    async fn upload(&self, bytes: &[u8]) -> Result<String, TranscriptionError> {
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", self.api_key.expose_secret())
            .header("content-type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(Self::request_error)?;

        let upload: UploadResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::invalid)?;
        Ok(upload.upload_url)
    }

    async fn create_transcript(
        &self,
        audio_url: &str,
        language_hint: Option<&str>,
    ) -> Result<TranscriptResponse, TranscriptionError> {
        let body = TranscriptRequest {
            audio_url,
            language_code: language_hint,
            language_detection: language_hint.is_none(),
            speaker_labels: true,
        };

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(Self::request_error)?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::invalid)
    }

    async fn poll(&self, id: &str) -> Result<String, TranscriptionError> {
        for poll in 0..self.max_polls {
            let response = self
                .client
                .get(format!("{}/transcript/{}", self.base_url, id))
                .header("authorization", self.api_key.expose_secret())
                .send()
                .await
                .map_err(Self::request_error)?;

            let transcript: TranscriptResponse = Self::check(response)
                .await?
                .json()
                .await
                .map_err(Self::invalid)?;

            match transcript.status.as_str() {
                "completed" => {
                    return transcript.text.ok_or_else(|| TranscriptionError::InvalidResponse {
                        provider: PROVIDER,
                        message: "completed transcript without text".to_string(),
                    })
                }
                "error" => {
                    return Err(TranscriptionError::Failed {
                        provider: PROVIDER,
                        message: transcript.error.unwrap_or_else(|| "unknown error".to_string()),
                    })
                }
                status => debug!("AssemblyAI transcript {} is {} (poll {})", id, status, poll + 1),
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(TranscriptionError::PollLimit {
            provider: PROVIDER,
            polls: self.max_polls,
        })
    }
}

#[async_trait]
impl SpeechToTextProvider for AssemblyAiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn transcribe(
        &self,
        artifact: &Artifact,
        language_hint: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        let upload_url = self.upload(artifact.bytes()).await?;
        let created = self.create_transcript(&upload_url, language_hint).await?;
        tracing::debug!(id = %created.id, "AssemblyAI transcript created");
        let text = self.poll(&created.id).await?;
        tracing::info!(chars = text.len(), "AssemblyAI transcription completed");
        Ok(text)
    }
}
