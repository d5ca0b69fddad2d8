use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use secrecy::SecretString;

use crate::artifact::Artifact;

use super::assemblyai::AssemblyAiProvider;
use super::error::TranscriptionError;
use super::openai::WhisperProvider;

/// A speech-to-text backend.
#[async_trait]
pub trait SpeechToTextProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(
        &self,
        artifact: &Artifact,
        language_hint: Option<&str>,
    ) -> Result<String, TranscriptionError>;
}

/// Resolved credentials for the speech providers. A provider is only built
/// when its key is present.
#[derive(Default, Clone)]
pub struct SpeechCredentials {
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: Option<String>,
    pub assemblyai_api_key: Option<SecretString>,
    pub assemblyai_base_url: Option<String>,
}

/// Builds the configured providers in priority order: Whisper first, then
/// AssemblyAI. A provider whose client cannot be built is skipped.
pub fn build_speech_providers(credentials: &SpeechCredentials) -> Vec<Arc<dyn SpeechToTextProvider>> {
    let mut providers: Vec<Arc<dyn SpeechToTextProvider>> = Vec::new();

    if let Some(key) = &credentials.openai_api_key {
        match WhisperProvider::new(key.clone(), credentials.openai_base_url.clone()) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => warn!("OpenAI Whisper unavailable: {}", e),
        }
    }

    if let Some(key) = &credentials.assemblyai_api_key {
        match AssemblyAiProvider::new(key.clone(), credentials.assemblyai_base_url.clone()) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => warn!("AssemblyAI unavailable: {}", e),
        }
    }

    if providers.is_empty() {
        info!("No speech-to-text provider configured");
    } else {
        info!(
            "Speech-to-text providers: {}",
            providers.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );
    }

    providers
}
