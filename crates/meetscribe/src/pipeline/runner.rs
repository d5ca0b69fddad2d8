use std::sync::Arc;

use log::{info, warn};
use tracing::Instrument;

use crate::artifact::Artifact;
use crate::generation::Generator;
use crate::guidance;
use crate::large_file::{LargeFileFailure, LargeFileOutcome, LargeFileProcessor};
use crate::processor::{ContentExtractor, ExtractionResult};

use super::context::PipelineContext;
use super::progress::{JobPhase, ProgressEvent, ProgressReporter};

/// How a job's artifact is turned into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// ffmpeg audio extraction and segmented transcription.
    Video,
    /// Chunked summarisation through the large-file processor.
    LargeFile,
    /// Single extraction followed by one generation call.
    Direct,
}

impl Strategy {
    /// Video wins over size. Only files strictly above `large_threshold` are large.
    pub fn select(artifact: Option<&Artifact>, large_threshold: u64) -> Self {
        match artifact {
            Some(a) if a.is_video() => Strategy::Video,
            Some(a) if a.byte_size() > large_threshold => Strategy::LargeFile,
            _ => Strategy::Direct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Video => "video",
            Strategy::LargeFile => "large_file",
            Strategy::Direct => "direct",
        }
    }
}

/// Final text of a job run. Guidance and degraded results count as output.
/// `failure` is set when the artifact could not be processed at all; the
/// content then holds the message for the user.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub content: String,
    pub strategy: Strategy,
    pub failure: Option<String>,
}

impl PipelineOutput {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// A run that ended without a document: short error plus user message.
struct RunFailure {
    error: String,
    message: String,
}

type RunResult = Result<String, RunFailure>;

pub struct JobPipeline {
    extractor: Arc<ContentExtractor>,
    generator: Arc<Generator>,
    large_files: Arc<LargeFileProcessor>,
    large_threshold: u64,
}

impl JobPipeline {
    pub fn new(
        extractor: Arc<ContentExtractor>,
        generator: Arc<Generator>,
        large_files: Arc<LargeFileProcessor>,
        large_threshold: u64,
    ) -> Self {
        Self {
            extractor,
            generator,
            large_files,
            large_threshold,
        }
    }

    pub fn generator(&self) -> &Arc<Generator> {
        &self.generator
    }

    /// Runs one job to its output. Extraction, transcription and generation
    /// problems resolve to guidance or a degraded document. Only oversized or
    /// unprocessable large files come back marked as failed.
    pub async fn run(&self, ctx: &PipelineContext, progress: &dyn ProgressReporter) -> PipelineOutput {
        let strategy = Strategy::select(ctx.artifact.as_ref(), self.large_threshold);
        let span = tracing::info_span!(
            "pipeline",
            meeting_id = ctx.meeting_id,
            job_id = ctx.job_id,
            kind = ctx.kind.as_str(),
            strategy = strategy.as_str(),
        );

        async {
            info!(
                "Job {} ({}) using {} strategy",
                ctx.job_id,
                ctx.kind,
                strategy.as_str()
            );

            let result = match (&ctx.artifact, strategy) {
                (Some(artifact), Strategy::Video) => self.run_video(ctx, artifact, progress).await,
                (Some(artifact), Strategy::LargeFile) => {
                    self.run_large(ctx, artifact, progress).await
                }
                (artifact, _) => Ok(self.run_direct(ctx, artifact.as_ref(), progress).await),
            };

            match result {
                Ok(content) => PipelineOutput {
                    content,
                    strategy,
                    failure: None,
                },
                Err(RunFailure { error, message }) => PipelineOutput {
                    content: message,
                    strategy,
                    failure: Some(error),
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn run_direct(
        &self,
        ctx: &PipelineContext,
        artifact: Option<&Artifact>,
        progress: &dyn ProgressReporter,
    ) -> String {
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Extracting,
            message: "Extracting meeting content...".to_string(),
        });

        let extraction = match artifact {
            Some(artifact) => self.extractor.extract_in(artifact, ctx.language).await,
            None => ExtractionResult::no_file(ctx.language),
        };

        match extraction {
            ExtractionResult::Text(content) => {
                progress.report(ProgressEvent::Phase {
                    phase: JobPhase::Generating,
                    message: format!("Generating {}...", ctx.kind),
                });
                self.generator
                    .generate_or_fallback(&ctx.generation_request(content))
                    .await
            }
            ExtractionResult::Unextractable { reason, detail } => {
                info!(
                    "Nothing to generate from ({}), returning guidance",
                    reason.as_str()
                );
                detail
            }
        }
    }

    async fn run_large(
        &self,
        ctx: &PipelineContext,
        artifact: &Artifact,
        progress: &dyn ProgressReporter,
    ) -> RunResult {
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Chunking,
            message: format!("Processing large file ({:.2} MB)...", artifact.size_mb()),
        });

        match self.large_files.process(artifact, ctx.language).await {
            LargeFileOutcome::Processed {
                content,
                chunks_processed,
                total_length,
            } => {
                info!(
                    "Large file reduced from {} characters over {} chunks",
                    total_length, chunks_processed
                );
                progress.report(ProgressEvent::Phase {
                    phase: JobPhase::Generating,
                    message: format!("Generating {}...", ctx.kind),
                });
                Ok(self
                    .generator
                    .generate_large_or_fallback(&ctx.generation_request(content))
                    .await)
            }
            LargeFileOutcome::Unextractable { reason, detail } => {
                info!(
                    "Nothing to generate from ({}), returning guidance",
                    reason.as_str()
                );
                Ok(detail)
            }
            LargeFileOutcome::Failed { error, message, .. } => {
                warn!("Large file processing failed: {}", error);
                Err(RunFailure { error, message })
            }
        }
    }

    async fn run_video(
        &self,
        ctx: &PipelineContext,
        artifact: &Artifact,
        progress: &dyn ProgressReporter,
    ) -> RunResult {
        let max_bytes = self.large_files.settings().max_file_bytes;
        if artifact.byte_size() > max_bytes {
            warn!("Video {} exceeds {} bytes", artifact.filename(), max_bytes);
            return Err(RunFailure {
                error: LargeFileFailure::Oversized.title(ctx.language).to_string(),
                message: LargeFileFailure::Oversized.message(max_bytes, ctx.language),
            });
        }

        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Transcribing,
            message: "Extracting and transcribing audio...".to_string(),
        });

        match self.large_files.transcribe_video(artifact).await {
            Ok(transcript) => {
                info!(
                    "Video transcribed: {} characters from {} segment(s)",
                    transcript.text.chars().count(),
                    transcript.segments
                );
                progress.report(ProgressEvent::Phase {
                    phase: JobPhase::Generating,
                    message: format!("Generating {}...", ctx.kind),
                });
                Ok(self
                    .generator
                    .generate_or_fallback(&ctx.generation_request(transcript.text))
                    .await)
            }
            Err(failure) => {
                warn!("Video pipeline produced no transcript: {}", failure.reason);
                Ok(guidance::video_unavailable(
                    artifact.filename(),
                    artifact.byte_size(),
                    artifact.media_type(),
                    &failure.reason,
                    ctx.language,
                ))
            }
        }
    }
}
