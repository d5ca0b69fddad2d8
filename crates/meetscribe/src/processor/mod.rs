//! Content extraction from uploaded artifacts.
//!
//! Every failure path produces an [`ExtractionResult::Unextractable`] carrying
//! actionable guidance text. Nothing here returns a hard error to the caller.

pub mod docx;
pub mod pdf;
pub mod text;

use std::sync::Arc;

use log::{info, warn};
use tracing::Instrument;

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::ProcessError;
use crate::generation::Language;
use crate::guidance;
use crate::transcription::Transcriber;

/// Minimum trimmed character count for a PDF text layer to count as content.
pub const MIN_PDF_TEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnextractableReason {
    NoFile,
    UnsupportedFormat,
    EmptyContent,
    ExtractionError,
}

impl UnextractableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnextractableReason::NoFile => "no_file",
            UnextractableReason::UnsupportedFormat => "unsupported_format",
            UnextractableReason::EmptyContent => "empty_content",
            UnextractableReason::ExtractionError => "extraction_error",
        }
    }
}

/// Outcome of extraction: text or a reason with guidance, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Text(String),
    Unextractable {
        reason: UnextractableReason,
        detail: String,
    },
}

impl ExtractionResult {
    pub fn unextractable(reason: UnextractableReason, detail: impl Into<String>) -> Self {
        ExtractionResult::Unextractable {
            reason,
            detail: detail.into(),
        }
    }

    pub fn no_file(language: Language) -> Self {
        Self::unextractable(UnextractableReason::NoFile, guidance::no_file(language))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ExtractionResult::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ExtractionResult::Text(text) => Some(text),
            ExtractionResult::Unextractable { .. } => None,
        }
    }

    /// The extracted text, or the guidance message that stands in for it.
    pub fn into_content(self) -> String {
        match self {
            ExtractionResult::Text(text) => text,
            ExtractionResult::Unextractable { detail, .. } => detail,
        }
    }
}

/// Synchronous text extraction for one document family.
pub trait DocumentProcessor: Send + Sync {
    fn process(&self, bytes: &[u8]) -> Result<String, ProcessError>;
    fn supports(&self, kind: ArtifactKind) -> bool;
}

pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: vec![
                Box::new(text::TextProcessor::new()),
                Box::new(pdf::PdfProcessor::new()),
                Box::new(docx::DocxProcessor::new()),
            ],
        }
    }

    pub fn supports(&self, kind: ArtifactKind) -> bool {
        self.processors.iter().any(|p| p.supports(kind))
    }

    pub fn process(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<String, ProcessError> {
        for processor in &self.processors {
            if processor.supports(kind) {
                return processor.process(bytes);
            }
        }

        Err(ProcessError::UnsupportedFormat(format!("{:?}", kind)))
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContentExtractor {
    registry: ProcessorRegistry,
    transcriber: Option<Arc<Transcriber>>,
}

impl ContentExtractor {
    pub fn new(transcriber: Arc<Transcriber>) -> Self {
        Self {
            registry: ProcessorRegistry::new(),
            transcriber: Some(transcriber),
        }
    }

    /// An extractor without a transcriber. Audio and video always resolve to
    /// their transcription-fallback guidance.
    pub fn documents_only() -> Self {
        Self {
            registry: ProcessorRegistry::new(),
            transcriber: None,
        }
    }

    pub async fn extract(&self, artifact: &Artifact) -> ExtractionResult {
        self.extract_in(artifact, Language::default()).await
    }

    /// Extracts text, writing guidance messages in `language`.
    pub async fn extract_in(&self, artifact: &Artifact, language: Language) -> ExtractionResult {
        let span = tracing::info_span!(
            "extract",
            kind = ?artifact.kind(),
            media_type = artifact.media_type(),
            bytes = artifact.byte_size(),
        );
        self.extract_inner(artifact, language).instrument(span).await
    }

    async fn extract_inner(&self, artifact: &Artifact, language: Language) -> ExtractionResult {
        let kind = artifact.kind();
        info!(
            "Extracting {} ({}, {} bytes)",
            artifact.filename(),
            artifact.media_type(),
            artifact.byte_size()
        );

        if artifact.bytes().is_empty() {
            return ExtractionResult::unextractable(
                UnextractableReason::EmptyContent,
                guidance::no_content(artifact.media_type(), language),
            );
        }

        match kind {
            ArtifactKind::Text | ArtifactKind::Word => self.extract_document(artifact, kind, language),
            ArtifactKind::Pdf => self.extract_pdf(artifact, language),
            ArtifactKind::Audio | ArtifactKind::Video => {
                self.extract_media(artifact, kind, language).await
            }
            ArtifactKind::Unknown => ExtractionResult::unextractable(
                UnextractableReason::UnsupportedFormat,
                guidance::unsupported_format(artifact.media_type(), language),
            ),
        }
    }

    fn extract_document(
        &self,
        artifact: &Artifact,
        kind: ArtifactKind,
        language: Language,
    ) -> ExtractionResult {
        match self.registry.process(kind, artifact.bytes()) {
            Ok(text) if text.trim().is_empty() => ExtractionResult::unextractable(
                UnextractableReason::EmptyContent,
                guidance::no_content(artifact.media_type(), language),
            ),
            Ok(text) => ExtractionResult::Text(text),
            Err(e) => {
                warn!("Extraction failed for {}: {}", artifact.filename(), e);
                ExtractionResult::unextractable(
                    UnextractableReason::ExtractionError,
                    guidance::extraction_error(&e.to_string(), language),
                )
            }
        }
    }

    fn extract_pdf(&self, artifact: &Artifact, language: Language) -> ExtractionResult {
        match self.registry.process(ArtifactKind::Pdf, artifact.bytes()) {
            Ok(text) if text.trim().chars().count() < MIN_PDF_TEXT_CHARS => {
                info!(
                    "PDF {} has no usable text layer ({} chars)",
                    artifact.filename(),
                    text.trim().chars().count()
                );
                ExtractionResult::unextractable(
                    UnextractableReason::EmptyContent,
                    guidance::pdf_without_text(language),
                )
            }
            Ok(text) => ExtractionResult::Text(text),
            Err(e) => {
                warn!("PDF extraction failed for {}: {}", artifact.filename(), e);
                ExtractionResult::unextractable(
                    UnextractableReason::ExtractionError,
                    guidance::pdf_without_text(language),
                )
            }
        }
    }

    async fn extract_media(
        &self,
        artifact: &Artifact,
        kind: ArtifactKind,
        language: Language,
    ) -> ExtractionResult {
        let transcript = match &self.transcriber {
            Some(transcriber) => transcriber.transcribe(artifact).await,
            None => None,
        };

        match transcript {
            Some(transcript) => ExtractionResult::Text(transcript.text),
            None => {
                let message = if kind == ArtifactKind::Video {
                    guidance::video_fallback(language)
                } else {
                    guidance::audio_fallback(language)
                };
                ExtractionResult::unextractable(UnextractableReason::ExtractionError, message)
            }
        }
    }
}
