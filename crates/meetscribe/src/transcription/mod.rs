//! Transcription with a chain of fallback strategies.
//!
//! Strategies run in order and stop at the first one whose trimmed output is
//! longer than the configured minimum:
//!
//! 1. the bytes are really a document (PDF, Word or plain text) mislabelled as media
//! 2. each configured speech-to-text provider in priority order
//! 3. a metadata placeholder, if enabled
//!
//! Provider errors are logged and treated as soft failures. [`Transcriber::transcribe`]
//! never returns an error; exhaustion yields `None`.

pub mod assemblyai;
mod error;
pub mod metadata;
pub mod openai;
mod provider;

use std::sync::Arc;

use log::{debug, info, warn};
use tracing::Instrument;

use crate::artifact::{Artifact, ArtifactKind};
use crate::generation::Language;
use crate::processor::ProcessorRegistry;

pub use error::TranscriptionError;
pub use provider::{build_speech_providers, SpeechCredentials, SpeechToTextProvider};

/// Prefix of every metadata placeholder. Content starting with it is not a
/// real transcript.
pub const METADATA_MARKER: &str = "[METADATA ONLY]";

/// Share of characters that must be printable for bytes to count as text.
const PRINTABLE_RATIO: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptSource {
    /// The media bytes were a disguised document.
    Document,
    /// A speech-to-text provider, by name.
    Provider(String),
    /// Descriptive placeholder only.
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub source: TranscriptSource,
}

impl Transcript {
    pub fn is_placeholder(&self) -> bool {
        self.source == TranscriptSource::Metadata
    }
}

#[derive(Debug, Clone)]
pub struct TranscriberSettings {
    /// Output must be strictly longer than this (trimmed, in characters).
    pub min_chars: usize,
    pub metadata_fallback: bool,
    /// Passed to providers; `None` lets them detect the spoken language.
    pub language_hint: Option<Language>,
}

impl Default for TranscriberSettings {
    fn default() -> Self {
        Self {
            min_chars: 50,
            metadata_fallback: true,
            language_hint: None,
        }
    }
}

pub struct Transcriber {
    registry: ProcessorRegistry,
    providers: Vec<Arc<dyn SpeechToTextProvider>>,
    settings: TranscriberSettings,
}

impl Transcriber {
    pub fn new(providers: Vec<Arc<dyn SpeechToTextProvider>>, settings: TranscriberSettings) -> Self {
        Self {
            registry: ProcessorRegistry::new(),
            providers,
            settings,
        }
    }

    pub fn settings(&self) -> &TranscriberSettings {
        &self.settings
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    pub async fn transcribe(&self, artifact: &Artifact) -> Option<Transcript> {
        let span = tracing::info_span!(
            "transcribe",
            filename = artifact.filename(),
            bytes = artifact.byte_size(),
        );
        self.transcribe_inner(artifact).instrument(span).await
    }

    async fn transcribe_inner(&self, artifact: &Artifact) -> Option<Transcript> {
        let min_chars = self.settings.min_chars;

        if let Some(text) = self.try_document(artifact) {
            info!("{} is a disguised document, using its text", artifact.filename());
            return Some(Transcript {
                text,
                source: TranscriptSource::Document,
            });
        }

        if let Some((text, provider)) = self.try_providers(artifact, min_chars).await {
            return Some(Transcript {
                text,
                source: TranscriptSource::Provider(provider.to_string()),
            });
        }

        if self.settings.metadata_fallback {
            info!(
                "All transcription strategies failed for {}, using metadata placeholder",
                artifact.filename()
            );
            let language = self.settings.language_hint.unwrap_or_default();
            return Some(Transcript {
                text: metadata::describe(artifact, language),
                source: TranscriptSource::Metadata,
            });
        }

        warn!("No transcription strategy succeeded for {}", artifact.filename());
        None
    }

    /// Transcribes one media segment with the providers only. Returns the
    /// first trimmed output longer than `min_chars`.
    pub async fn transcribe_segment(&self, segment: &Artifact, min_chars: usize) -> Option<String> {
        self.try_providers(segment, min_chars)
            .await
            .map(|(text, _)| text)
    }

    fn try_document(&self, artifact: &Artifact) -> Option<String> {
        let kind = sniff_document(artifact.bytes())?;
        match self.registry.process(kind, artifact.bytes()) {
            Ok(text) if exceeds(&text, self.settings.min_chars) => Some(text.trim().to_string()),
            Ok(text) => {
                debug!(
                    "Document strategy produced {} chars, below threshold",
                    text.trim().chars().count()
                );
                None
            }
            Err(e) => {
                debug!("Document strategy failed: {}", e);
                None
            }
        }
    }

    async fn try_providers(&self, artifact: &Artifact, min_chars: usize) -> Option<(String, &'static str)> {
        let hint = self.settings.language_hint.map(|l| l.code());

        for provider in &self.providers {
            debug!("Trying transcription provider {}", provider.name());
            match provider.transcribe(artifact, hint).await {
                Ok(text) if exceeds(&text, min_chars) => {
                    info!("Transcribed {} with {}", artifact.filename(), provider.name());
                    return Some((text.trim().to_string(), provider.name()));
                }
                Ok(text) => warn!(
                    "{} returned {} chars, trying next strategy",
                    provider.name(),
                    text.trim().chars().count()
                ),
                Err(e) => warn!("{} failed: {}", provider.name(), e),
            }
        }

        None
    }
}

fn exceeds(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() > min_chars
}

/// Recognises document content by magic bytes, or printable UTF-8 text.
fn sniff_document(bytes: &[u8]) -> Option<ArtifactKind> {
    if bytes.starts_with(b"%PDF") {
        return Some(ArtifactKind::Pdf);
    }
    if bytes.starts_with(b"PK\x03\x04") {
        return Some(ArtifactKind::Word);
    }

    let text = std::str::from_utf8(bytes).ok()?;
    let total = text.chars().count();
    if total == 0 {
        return None;
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .count();

    if printable as f64 / total as f64 >= PRINTABLE_RATIO {
        Some(ArtifactKind::Text)
    } else {
        None
    }
}
