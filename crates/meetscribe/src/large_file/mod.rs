//! Strategy selection for artifacts above the large-file threshold.
//!
//! Long text is split into chunks that are summarised independently and then
//! merged in order. Long videos are cut into fixed wall-clock segments that
//! are transcribed one by one. Segment boundaries ignore speech, so a
//! sentence may be split across two transcripts.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tempfile::TempDir;
use tracing::Instrument;

use crate::artifact::{Artifact, ArtifactKind};
use crate::chunking;
use crate::config::{ChunkingConfig, LimitsConfig};
use crate::generation::{Generator, Language};
use crate::guidance;
use crate::media::{segment_bounds, MediaError, MediaToolkit};
use crate::processor::{
    ContentExtractor, ExtractionResult, ProcessorRegistry, UnextractableReason,
};
use crate::transcription::Transcriber;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct LargeFileSettings {
    pub max_file_bytes: u64,
    pub max_chunk_chars: usize,
    pub video_segment: Duration,
    pub min_transcript_chars: usize,
    pub min_segment_chars: usize,
    pub min_extracted_audio_bytes: u64,
}

impl LargeFileSettings {
    pub fn from_config(limits: &LimitsConfig, chunking: &ChunkingConfig) -> Self {
        Self {
            max_file_bytes: limits.max_file_bytes,
            max_chunk_chars: chunking.max_chunk_chars,
            video_segment: Duration::from_secs(limits.video_segment_secs),
            min_transcript_chars: limits.min_transcript_chars,
            min_segment_chars: limits.min_segment_chars,
            min_extracted_audio_bytes: limits.min_extracted_audio_bytes,
        }
    }
}

impl Default for LargeFileSettings {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default(), &ChunkingConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LargeFileFailure {
    Oversized,
    VideoProcessing,
    Transcription,
    UnsupportedType,
}

impl LargeFileFailure {
    pub fn title(&self, language: Language) -> &'static str {
        match (self, language) {
            (LargeFileFailure::Oversized, Language::Es) => "Archivo demasiado grande",
            (LargeFileFailure::Oversized, Language::En) => "File too large",
            (LargeFileFailure::VideoProcessing, Language::Es) => "Error procesando video",
            (LargeFileFailure::VideoProcessing, Language::En) => "Video processing error",
            (LargeFileFailure::Transcription, Language::Es) => "Error de transcripción",
            (LargeFileFailure::Transcription, Language::En) => "Transcription error",
            (LargeFileFailure::UnsupportedType, Language::Es) => "Tipo de archivo no soportado",
            (LargeFileFailure::UnsupportedType, Language::En) => "Unsupported file type",
        }
    }

    pub fn message(&self, max_file_bytes: u64, language: Language) -> String {
        match self {
            LargeFileFailure::Oversized => {
                guidance::oversized_file(max_file_bytes / BYTES_PER_MB, language)
            }
            LargeFileFailure::VideoProcessing => guidance::video_processing_error(language),
            LargeFileFailure::Transcription => guidance::transcription_error(language),
            LargeFileFailure::UnsupportedType => guidance::unsupported_type(language),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LargeFileOutcome {
    Processed {
        content: String,
        chunks_processed: usize,
        total_length: usize,
    },
    /// Nothing usable came out of the artifact. `detail` is guidance for the
    /// user and must not be handed to the generator.
    Unextractable {
        reason: UnextractableReason,
        detail: String,
    },
    Failed {
        failure: LargeFileFailure,
        error: String,
        message: String,
    },
}

impl LargeFileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LargeFileOutcome::Processed { .. })
    }

    /// The processed content, or the failure message that stands in for it.
    pub fn into_content(self) -> String {
        match self {
            LargeFileOutcome::Processed { content, .. } => content,
            LargeFileOutcome::Unextractable { detail, .. } => detail,
            LargeFileOutcome::Failed { message, .. } => message,
        }
    }
}

/// Why a video yielded no transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFailure {
    pub failure: LargeFileFailure,
    pub reason: String,
}

impl VideoFailure {
    fn processing(reason: impl Into<String>) -> Self {
        Self {
            failure: LargeFileFailure::VideoProcessing,
            reason: reason.into(),
        }
    }

    fn transcription(reason: impl Into<String>) -> Self {
        Self {
            failure: LargeFileFailure::Transcription,
            reason: reason.into(),
        }
    }
}

/// A video transcript and the number of segments it was assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTranscript {
    pub text: String,
    pub segments: usize,
}

pub struct LargeFileProcessor {
    extractor: Arc<ContentExtractor>,
    transcriber: Arc<Transcriber>,
    generator: Arc<Generator>,
    media: Arc<dyn MediaToolkit>,
    registry: ProcessorRegistry,
    settings: LargeFileSettings,
}

impl LargeFileProcessor {
    pub fn new(
        extractor: Arc<ContentExtractor>,
        transcriber: Arc<Transcriber>,
        generator: Arc<Generator>,
        media: Arc<dyn MediaToolkit>,
        settings: LargeFileSettings,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            generator,
            media,
            registry: ProcessorRegistry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &LargeFileSettings {
        &self.settings
    }

    pub async fn process(&self, artifact: &Artifact, language: Language) -> LargeFileOutcome {
        let span = tracing::info_span!(
            "large_file",
            kind = ?artifact.kind(),
            bytes = artifact.byte_size(),
        );
        self.process_inner(artifact, language).instrument(span).await
    }

    async fn process_inner(&self, artifact: &Artifact, language: Language) -> LargeFileOutcome {
        info!(
            "Processing large file {} ({:.2} MB, {})",
            artifact.filename(),
            artifact.size_mb(),
            artifact.media_type()
        );

        if artifact.byte_size() > self.settings.max_file_bytes {
            warn!(
                "{} exceeds the {} byte limit",
                artifact.filename(),
                self.settings.max_file_bytes
            );
            return self.failed(LargeFileFailure::Oversized, language);
        }

        match artifact.kind() {
            ArtifactKind::Video => self.process_video(artifact, language).await,
            ArtifactKind::Text | ArtifactKind::Pdf | ArtifactKind::Word | ArtifactKind::Audio => {
                match self.extractor.extract_in(artifact, language).await {
                    ExtractionResult::Text(content) => self.process_text(content, language).await,
                    ExtractionResult::Unextractable { reason, detail } => {
                        info!(
                            "Nothing extractable in {} ({})",
                            artifact.filename(),
                            reason.as_str()
                        );
                        LargeFileOutcome::Unextractable { reason, detail }
                    }
                }
            }
            ArtifactKind::Unknown => match self.extract_any(artifact) {
                Some(content) => self.process_text(content, language).await,
                None => self.failed(LargeFileFailure::UnsupportedType, language),
            },
        }
    }

    async fn process_video(&self, artifact: &Artifact, language: Language) -> LargeFileOutcome {
        match self.transcribe_video(artifact).await {
            Ok(transcript) => {
                let total_length = transcript.text.chars().count();
                LargeFileOutcome::Processed {
                    content: transcript.text,
                    chunks_processed: transcript.segments,
                    total_length,
                }
            }
            Err(e) => {
                warn!("Video {} not transcribed: {}", artifact.filename(), e.reason);
                self.failed(e.failure, language)
            }
        }
    }

    /// Text at or under the chunk size passes through untouched. Longer text
    /// is summarised chunk by chunk and merged. Failed chunks are skipped.
    async fn process_text(&self, content: String, language: Language) -> LargeFileOutcome {
        let total_length = content.chars().count();
        if total_length <= self.settings.max_chunk_chars {
            return LargeFileOutcome::Processed {
                content,
                chunks_processed: 1,
                total_length,
            };
        }

        let chunks = chunking::split(&content, self.settings.max_chunk_chars);
        info!("Processing {} characters in {} chunks", total_length, chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            match self.generator.summarize_chunk(chunk, language).await {
                Ok(summary) => partials.push(summary),
                Err(e) => warn!(
                    "Skipping chunk {}/{}: {}",
                    chunk.index + 1,
                    chunk.total,
                    e
                ),
            }
        }

        LargeFileOutcome::Processed {
            content: self.generator.combine_partials(partials, language).await,
            chunks_processed: chunks.len(),
            total_length,
        }
    }

    /// Best effort for unknown media types: UTF-8 text first, then the
    /// document processors.
    fn extract_any(&self, artifact: &Artifact) -> Option<String> {
        if let Ok(text) = std::str::from_utf8(artifact.bytes()) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }

        [ArtifactKind::Pdf, ArtifactKind::Word]
            .into_iter()
            .find_map(|kind| self.registry.process(kind, artifact.bytes()).ok())
            .filter(|text| !text.trim().is_empty())
    }

    /// Transcribes a video. Videos longer than the segment length are cut
    /// into segments first. Shorter ones (or ones whose duration cannot be
    /// probed) go through audio extraction and the full transcriber chain.
    pub async fn transcribe_video(&self, artifact: &Artifact) -> Result<VideoTranscript, VideoFailure> {
        let workspace = TempDir::with_prefix("meetscribe-video-")
            .map_err(|e| VideoFailure::processing(format!("temp dir: {}", e)))?;
        let input = workspace.path().join(format!("input.{}", artifact.extension()));
        tokio::fs::write(&input, artifact.bytes())
            .await
            .map_err(|e| VideoFailure::processing(format!("write input: {}", e)))?;

        match self.media.probe_duration(&input).await {
            Ok(duration) if duration > self.settings.video_segment => {
                info!(
                    "Video lasts {}s, transcribing in {}s segments",
                    duration.as_secs(),
                    self.settings.video_segment.as_secs()
                );
                self.transcribe_segments(artifact, &input, workspace.path(), duration)
                    .await
            }
            Ok(_) => self.transcribe_whole(artifact, &input, workspace.path()).await,
            Err(e) => {
                warn!("Could not probe video duration: {}", e);
                self.transcribe_whole(artifact, &input, workspace.path()).await
            }
        }
    }

    async fn transcribe_segments(
        &self,
        artifact: &Artifact,
        input: &Path,
        workdir: &Path,
        duration: Duration,
    ) -> Result<VideoTranscript, VideoFailure> {
        let bounds = segment_bounds(duration, self.settings.video_segment);
        let total = bounds.len();
        let mut cut = 0usize;
        let mut transcripts = Vec::new();

        for (index, (start, length)) in bounds.into_iter().enumerate() {
            let path = workdir.join(format!("segment_{:03}.{}", index, artifact.extension()));
            if let Err(e) = self.media.cut_segment(input, start, length, &path).await {
                warn!("Segment {}/{} could not be cut: {}", index + 1, total, e);
                continue;
            }

            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) => {
                    warn!("Segment {}/{} is empty", index + 1, total);
                    continue;
                }
                Err(e) => {
                    warn!("Segment {}/{} unreadable: {}", index + 1, total, e);
                    continue;
                }
            };
            cut += 1;

            let segment = Artifact::new(
                format!("segment_{:03}.{}", index, artifact.extension()),
                artifact.media_type(),
                bytes,
            );
            match self
                .transcriber
                .transcribe_segment(&segment, self.settings.min_segment_chars)
                .await
            {
                Some(text) => {
                    info!("Segment {}/{} transcribed", index + 1, total);
                    transcripts.push(text);
                }
                None => warn!("Segment {}/{} produced no transcript", index + 1, total),
            }

            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove segment file: {}", e);
            }
        }

        if cut == 0 {
            return Err(VideoFailure::processing("no video segments could be created"));
        }
        if transcripts.is_empty() {
            return Err(VideoFailure::transcription("no segment could be transcribed"));
        }

        Ok(VideoTranscript {
            segments: transcripts.len(),
            text: transcripts.join("\n\n"),
        })
    }

    async fn transcribe_whole(
        &self,
        artifact: &Artifact,
        input: &Path,
        workdir: &Path,
    ) -> Result<VideoTranscript, VideoFailure> {
        let audio = match self.extract_audio(input, workdir).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Audio extraction failed, sending the video as is: {}", e);
                artifact.clone()
            }
        };

        let transcript = self
            .transcriber
            .transcribe(&audio)
            .await
            .filter(|t| !t.is_placeholder())
            .filter(|t| t.text.trim().chars().count() > self.settings.min_transcript_chars)
            .ok_or_else(|| VideoFailure::transcription("audio could not be transcribed"))?;

        Ok(VideoTranscript {
            text: transcript.text,
            segments: 1,
        })
    }

    async fn extract_audio(&self, input: &Path, workdir: &Path) -> Result<Artifact, MediaError> {
        let output = workdir.join("audio.wav");
        let size = self.media.extract_audio(input, &output).await?;
        if size <= self.settings.min_extracted_audio_bytes {
            return Err(MediaError::AudioTooSmall { size });
        }
        let bytes = tokio::fs::read(&output).await?;
        Ok(Artifact::new("audio.wav", "audio/wav", bytes))
    }

    fn failed(&self, failure: LargeFileFailure, language: Language) -> LargeFileOutcome {
        LargeFileOutcome::Failed {
            failure,
            error: failure.title(language).to_string(),
            message: failure.message(self.settings.max_file_bytes, language),
        }
    }
}
