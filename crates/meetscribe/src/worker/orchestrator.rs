//! Job orchestration: one spawned task per (meeting, kind) processing request.
//!
//! The job row is the durable record of every run. Whatever happens inside a
//! task, it ends with the job marked completed or failed and the meeting
//! status re-derived from its jobs.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::artifact::Artifact;
use crate::config::Config;
use crate::db::context_repo;
use crate::db::job_repo::{self, JobRow};
use crate::db::meeting_repo::{self, MeetingRow};
use crate::db::Database;
use crate::error::{MeetscribeError, OrchestratorError, Result};
use crate::generation::{
    ErrorClass, GeminiProvider, GenerationError, Generator, GeneratorSettings, Language,
    TextGenerationProvider, UnconfiguredProvider,
};
use crate::large_file::{LargeFileProcessor, LargeFileSettings};
use crate::media::FfmpegToolkit;
use crate::pipeline::{
    JobPipeline, JobProgressBroadcaster, NoopProgress, PipelineContext, PipelineOutput,
    ProgressEvent, ProgressReporter,
};
use crate::processor::ContentExtractor;
use crate::sanitize;
use crate::transcription::{build_speech_providers, Transcriber, TranscriberSettings};

use super::job::{JobKind, JobResult, JobStatus, MeetingStatus, ProcessingRequest};

type InFlight = Arc<Mutex<HashSet<(i64, JobKind)>>>;

/// Marks a (meeting, kind) pair as running until dropped.
#[derive(Debug)]
struct InFlightGuard {
    registry: InFlight,
    key: (i64, JobKind),
}

impl InFlightGuard {
    fn acquire(registry: &InFlight, meeting_id: i64, kind: JobKind) -> Result<Self> {
        let key = (meeting_id, kind);
        let mut running = registry.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(key) {
            return Err(OrchestratorError::AlreadyInFlight {
                meeting_id,
                kind: kind.to_string(),
            }
            .into());
        }
        Ok(Self {
            registry: Arc::clone(registry),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut running = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        running.remove(&self.key);
    }
}

/// A meeting together with all of its jobs.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingSnapshot {
    pub meeting: MeetingRow,
    pub jobs: Vec<JobRow>,
}

#[derive(Clone)]
pub struct JobOrchestrator {
    db: Database,
    pipeline: Arc<JobPipeline>,
    progress: Option<JobProgressBroadcaster>,
    sync_max_bytes: u64,
    in_flight: InFlight,
}

impl JobOrchestrator {
    pub fn new(db: Database, pipeline: Arc<JobPipeline>, sync_max_bytes: u64) -> Self {
        Self {
            db,
            pipeline,
            progress: None,
            sync_max_bytes,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Wires providers, extractor, transcriber and media tools from config.
    ///
    /// Missing credentials are not an error: without a Gemini key every job
    /// resolves to the basic-mode document, and without speech keys media
    /// falls through to the metadata placeholder.
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let provider: Arc<dyn TextGenerationProvider> = match config.credentials.gemini.resolve()? {
            Some(key) => Arc::new(
                GeminiProvider::new(
                    key,
                    config.generation.base_url.clone(),
                    config.generation.model.clone(),
                    Duration::from_secs(config.generation.timeout_secs),
                )
                .map_err(GenerationError::Provider)?,
            ),
            None => {
                warn!("No Gemini API key configured, documents will be generated in basic mode");
                Arc::new(UnconfiguredProvider)
            }
        };
        let generator = Arc::new(Generator::new(
            provider,
            GeneratorSettings::from_config(&config.generation),
        ));

        let speech = build_speech_providers(&config.credentials.speech_credentials()?);
        let transcriber = Arc::new(Transcriber::new(
            speech,
            TranscriberSettings {
                min_chars: config.limits.min_transcript_chars,
                metadata_fallback: config.transcription.metadata_fallback,
                language_hint: config.transcription.language_hint,
            },
        ));
        let extractor = Arc::new(ContentExtractor::new(Arc::clone(&transcriber)));
        let large_files = Arc::new(LargeFileProcessor::new(
            Arc::clone(&extractor),
            transcriber,
            Arc::clone(&generator),
            Arc::new(FfmpegToolkit::default()),
            LargeFileSettings::from_config(&config.limits, &config.chunking),
        ));

        let pipeline = JobPipeline::new(
            extractor,
            generator,
            large_files,
            config.limits.large_file_threshold_bytes,
        );
        Ok(Self::new(db, Arc::new(pipeline), config.limits.sync_max_bytes))
    }

    pub fn with_progress(mut self, broadcaster: JobProgressBroadcaster) -> Self {
        self.progress = Some(broadcaster);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Starts processing in the background and returns immediately.
    ///
    /// Rejects unknown meetings and a second request for a (meeting, kind)
    /// pair that is still running. Everything after the spawn is recorded on
    /// the job row rather than returned as an error.
    pub fn request_processing(&self, request: ProcessingRequest) -> Result<JoinHandle<JobResult>> {
        self.require_meeting(request.meeting_id)?;
        let guard = InFlightGuard::acquire(&self.in_flight, request.meeting_id, request.kind)?;
        let job = job_repo::find_or_create(&self.db, request.meeting_id, request.kind)?;

        info!(
            "Queued {} job {} for meeting {}",
            request.kind, job.id, request.meeting_id
        );

        let this = self.clone();
        Ok(tokio::spawn(async move {
            let _guard = guard;
            this.execute(job.id, request).await
        }))
    }

    /// Runs a job inline. Only artifacts up to the sync size limit are accepted.
    pub async fn run_sync(&self, request: ProcessingRequest) -> Result<JobResult> {
        let meeting = self.require_meeting(request.meeting_id)?;
        let size = meeting.byte_size.unwrap_or(0).max(0) as u64;
        if size > self.sync_max_bytes {
            return Err(OrchestratorError::TooLargeForSync {
                size,
                limit: self.sync_max_bytes,
            }
            .into());
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, request.meeting_id, request.kind)?;
        let job = job_repo::find_or_create(&self.db, request.meeting_id, request.kind)?;
        Ok(self.execute(job.id, request).await)
    }

    /// Translates the stored result of a job and overwrites it.
    ///
    /// A failed translation leaves the stored result untouched.
    pub async fn translate_job(
        &self,
        meeting_id: i64,
        kind: JobKind,
        target: Language,
    ) -> Result<String> {
        let _guard = InFlightGuard::acquire(&self.in_flight, meeting_id, kind)?;
        let job = job_repo::find_by_kind(&self.db, meeting_id, kind)?.ok_or_else(|| {
            OrchestratorError::JobNotFound {
                meeting_id,
                kind: kind.to_string(),
            }
        })?;

        let content = job
            .result
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| OrchestratorError::NothingToTranslate {
                meeting_id,
                kind: kind.to_string(),
            })?;

        let translated = self
            .pipeline
            .generator()
            .translate(&content, None, target)
            .await?;
        job_repo::update_result(&self.db, job.id, &translated)?;

        info!(
            "Translated {} job {} of meeting {} to {}",
            kind, job.id, meeting_id, target
        );
        Ok(translated)
    }

    pub fn status(&self, meeting_id: i64) -> Result<MeetingSnapshot> {
        let meeting = self.require_meeting(meeting_id)?;
        let jobs = job_repo::list_for_meeting(&self.db, meeting_id)?;
        Ok(MeetingSnapshot { meeting, jobs })
    }

    fn require_meeting(&self, meeting_id: i64) -> Result<MeetingRow> {
        meeting_repo::find_by_id(&self.db, meeting_id)?
            .ok_or_else(|| OrchestratorError::MeetingNotFound(meeting_id).into())
    }

    /// Drives one job to a terminal state. Never returns an error.
    async fn execute(&self, job_id: i64, request: ProcessingRequest) -> JobResult {
        let span = tracing::info_span!(
            "job",
            job_id,
            meeting_id = request.meeting_id,
            kind = request.kind.as_str(),
            language = request.language.code(),
        );

        async {
            let progress: Box<dyn ProgressReporter> = match &self.progress {
                Some(broadcaster) => Box::new(broadcaster.start_job(request.meeting_id, request.kind)),
                None => Box::new(NoopProgress),
            };

            match self.run_job(job_id, &request, progress.as_ref()).await {
                Ok(PipelineOutput {
                    content,
                    strategy,
                    failure: Some(error),
                }) => {
                    warn!("Job {} failed via {}: {}", job_id, strategy.as_str(), error);
                    self.finish(job_id, &request, JobStatus::Failed, &content);
                    progress.report(ProgressEvent::Failed { error });
                    JobResult::failure(job_id, &request, content, strategy.as_str())
                }
                Ok(output) => {
                    self.finish(job_id, &request, JobStatus::Completed, &output.content);
                    progress.report(ProgressEvent::Completed {
                        strategy: output.strategy.as_str(),
                    });
                    info!("Job {} completed via {}", job_id, output.strategy.as_str());
                    JobResult::success(job_id, &request, output.content, output.strategy.as_str())
                }
                Err(e) => {
                    error!("Job {} failed: {}", job_id, e);
                    let detail = e.to_string();
                    let message = failure_message(&e, &detail, request.language);
                    self.finish(job_id, &request, JobStatus::Failed, &message);
                    progress.report(ProgressEvent::Failed { error: detail });
                    JobResult::failure(job_id, &request, message, "none")
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_job(
        &self,
        job_id: i64,
        request: &ProcessingRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutput> {
        job_repo::update_status(&self.db, job_id, JobStatus::Processing, None)?;
        meeting_repo::update_status(&self.db, request.meeting_id, MeetingStatus::Processing)?;

        let meeting = self.require_meeting(request.meeting_id)?;
        let artifact = load_artifact(&meeting).await?;
        let business_context = match request.business_context_id {
            Some(id) => Some(
                context_repo::find_by_id(&self.db, id)?
                    .ok_or_else(|| {
                        OrchestratorError::InvalidRequest(format!(
                            "business context {} does not exist",
                            id
                        ))
                    })?
                    .content,
            ),
            None => None,
        };

        let ctx = PipelineContext::new(job_id, request, artifact)
            .with_business_context(business_context);
        Ok(self.pipeline.run(&ctx, progress).await)
    }

    /// Persists the terminal state and re-derives the meeting status.
    fn finish(&self, job_id: i64, request: &ProcessingRequest, status: JobStatus, result: &str) {
        let outcome = job_repo::update_status(&self.db, job_id, status, Some(result))
            .and_then(|_| job_repo::statuses_for_meeting(&self.db, request.meeting_id))
            .and_then(|statuses| {
                let meeting_status = MeetingStatus::derive(&statuses);
                meeting_repo::update_status(&self.db, request.meeting_id, meeting_status)
            });

        if let Err(e) = outcome {
            error!("Could not persist final state of job {}: {}", job_id, e);
        }
    }
}

async fn load_artifact(meeting: &MeetingRow) -> Result<Option<Artifact>> {
    let Some(path) = meeting.artifact_path.as_deref() else {
        return Ok(None);
    };

    let path = PathBuf::from(path);
    debug!(
        "Loading artifact {} for meeting {}",
        sanitize::redact_path(&path),
        meeting.id
    );
    let media_type = meeting.media_type.clone();
    let artifact = tokio::task::spawn_blocking(move || Artifact::from_path(&path, media_type.as_deref()))
        .await
        .map_err(|e| OrchestratorError::TaskFailed(e.to_string()))??;
    Ok(Some(artifact))
}

/// User-facing text stored on a failed job.
fn failure_message(error: &MeetscribeError, detail: &str, language: Language) -> String {
    let class = match error {
        MeetscribeError::Generation(e) => e.class(),
        _ => ErrorClass::classify_message(detail),
    };
    class.message(detail, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::db::context_repo::ContextType;
    use crate::db::meeting_repo::NewMeeting;
    use crate::generation::{GenerationParams, ProviderError, RetryPolicy};
    use crate::media::{MediaError, MediaToolkit};

    const MEETING: &str = "Marta opened the sprint review with the payments squad. They agreed to \
        ship the refund flow next week and Jorge will document the reconciliation job.";

    struct CountingProvider {
        calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerationProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> std::result::Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(format!("Generated document. {}", MEETING))
        }
    }

    struct NoMedia;

    #[async_trait]
    impl MediaToolkit for NoMedia {
        async fn probe_duration(
            &self,
            _input: &std::path::Path,
        ) -> std::result::Result<Duration, MediaError> {
            Err(MediaError::InvalidDuration("n/a".into()))
        }

        async fn extract_audio(
            &self,
            _input: &std::path::Path,
            _output: &std::path::Path,
        ) -> std::result::Result<u64, MediaError> {
            Err(MediaError::InvalidDuration("n/a".into()))
        }

        async fn cut_segment(
            &self,
            _input: &std::path::Path,
            _start: Duration,
            _length: Duration,
            _output: &std::path::Path,
        ) -> std::result::Result<(), MediaError> {
            Err(MediaError::InvalidDuration("n/a".into()))
        }
    }

    fn orchestrator(sync_max_bytes: u64) -> (JobOrchestrator, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        });
        let mut settings = GeneratorSettings::default();
        settings.retry = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_secs(5));
        let generator = Arc::new(Generator::new(provider.clone(), settings));
        let transcriber = Arc::new(Transcriber::new(Vec::new(), TranscriberSettings::default()));
        let extractor = Arc::new(ContentExtractor::new(transcriber.clone()));
        let large_files = Arc::new(LargeFileProcessor::new(
            extractor.clone(),
            transcriber,
            generator.clone(),
            Arc::new(NoMedia),
            LargeFileSettings::default(),
        ));
        let pipeline = JobPipeline::new(extractor, generator, large_files, 10 * 1024 * 1024);
        let db = Database::open_in_memory().unwrap();
        (
            JobOrchestrator::new(db, Arc::new(pipeline), sync_max_bytes),
            provider,
        )
    }

    fn meeting_with_text(orch: &JobOrchestrator, dir: &tempfile::TempDir, text: &str) -> i64 {
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, text).unwrap();
        meeting_repo::insert(
            orch.db(),
            &NewMeeting {
                artifact_path: Some(path.to_string_lossy().into_owned()),
                filename: Some("notes.txt".to_string()),
                media_type: Some("text/plain".to_string()),
                byte_size: Some(text.len() as u64),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let registry: InFlight = Arc::new(Mutex::new(HashSet::new()));
        let guard = InFlightGuard::acquire(&registry, 1, JobKind::Proposal).unwrap();

        let err = InFlightGuard::acquire(&registry, 1, JobKind::Proposal).unwrap_err();
        assert!(matches!(
            err,
            MeetscribeError::Orchestrator(OrchestratorError::AlreadyInFlight { .. })
        ));
        // other kinds of the same meeting are independent
        let _other = InFlightGuard::acquire(&registry, 1, JobKind::JiraTicket).unwrap();

        drop(guard);
        assert!(InFlightGuard::acquire(&registry, 1, JobKind::Proposal).is_ok());
    }

    #[tokio::test]
    async fn test_request_processing_completes_job_and_meeting() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, provider) = orchestrator(5 * 1024 * 1024);
        let meeting_id = meeting_with_text(&orch, &dir, MEETING);

        let handle = orch
            .request_processing(ProcessingRequest::new(
                meeting_id,
                JobKind::ExecutiveSummary,
                Language::En,
            ))
            .unwrap();
        let result = handle.await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.strategy, "direct");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let snapshot = orch.status(meeting_id).unwrap();
        assert_eq!(snapshot.meeting.status, MeetingStatus::Completed);
        assert_eq!(snapshot.jobs.len(), 1);
        assert_eq!(snapshot.jobs[0].status, JobStatus::Completed);
        assert!(snapshot.jobs[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_meeting_is_rejected() {
        let (orch, _) = orchestrator(1024);
        let err = orch
            .request_processing(ProcessingRequest::new(99, JobKind::Proposal, Language::Es))
            .unwrap_err();
        assert!(matches!(
            err,
            MeetscribeError::Orchestrator(OrchestratorError::MeetingNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_fails_job_and_meeting() {
        let (orch, _) = orchestrator(1024);
        let meeting = meeting_repo::insert(
            orch.db(),
            &NewMeeting {
                artifact_path: Some("/nonexistent/meetscribe/notes.txt".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let result = orch
            .run_sync(ProcessingRequest::new(meeting.id, JobKind::Proposal, Language::En))
            .await
            .unwrap();

        assert_eq!(result.status, JobStatus::Failed);
        assert!(result.result.starts_with("Unexpected error"));

        let snapshot = orch.status(meeting.id).unwrap();
        assert_eq!(snapshot.meeting.status, MeetingStatus::Failed);
        assert_eq!(snapshot.jobs[0].result.as_deref(), Some(result.result.as_str()));
    }

    #[tokio::test]
    async fn test_run_sync_rejects_large_artifacts() {
        let (orch, provider) = orchestrator(10);
        let dir = tempfile::tempdir().unwrap();
        let meeting_id = meeting_with_text(&orch, &dir, MEETING);

        let err = orch
            .run_sync(ProcessingRequest::new(meeting_id, JobKind::Proposal, Language::En))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeetscribeError::Orchestrator(OrchestratorError::TooLargeForSync { limit: 10, .. })
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(orch.status(meeting_id).unwrap().jobs.is_empty());
    }

    #[tokio::test]
    async fn test_business_context_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, provider) = orchestrator(5 * 1024 * 1024);
        let meeting_id = meeting_with_text(&orch, &dir, MEETING);
        let ctx = context_repo::insert(
            orch.db(),
            "Client",
            "Retail bank with strict audit rules",
            ContextType::KnowledgeBase,
        )
        .unwrap();

        orch.run_sync(
            ProcessingRequest::new(meeting_id, JobKind::Proposal, Language::En)
                .with_business_context(ctx.id),
        )
        .await
        .unwrap();

        assert!(provider.prompts.lock().unwrap()[0].contains("strict audit rules"));
    }

    #[tokio::test]
    async fn test_translate_job_requires_result() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, _) = orchestrator(5 * 1024 * 1024);
        let meeting_id = meeting_with_text(&orch, &dir, MEETING);

        let err = orch
            .translate_job(meeting_id, JobKind::JiraTicket, Language::Es)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeetscribeError::Orchestrator(OrchestratorError::JobNotFound { .. })
        ));

        job_repo::find_or_create(orch.db(), meeting_id, JobKind::JiraTicket).unwrap();
        let err = orch
            .translate_job(meeting_id, JobKind::JiraTicket, Language::Es)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeetscribeError::Orchestrator(OrchestratorError::NothingToTranslate { .. })
        ));
    }

    #[tokio::test]
    async fn test_translate_job_overwrites_result() {
        let dir = tempfile::tempdir().unwrap();
        let (orch, provider) = orchestrator(5 * 1024 * 1024);
        let meeting_id = meeting_with_text(&orch, &dir, MEETING);
        orch.run_sync(ProcessingRequest::new(
            meeting_id,
            JobKind::ExecutiveSummary,
            Language::En,
        ))
        .await
        .unwrap();

        let translated = orch
            .translate_job(meeting_id, JobKind::ExecutiveSummary, Language::Es)
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        let job = job_repo::find_by_kind(orch.db(), meeting_id, JobKind::ExecutiveSummary)
            .unwrap()
            .unwrap();
        assert_eq!(job.result.as_deref(), Some(translated.as_str()));
    }

    #[test]
    fn test_failure_message_uses_generation_class() {
        let err = MeetscribeError::Generation(GenerationError::Timeout { attempts: 5 });
        let message = failure_message(&err, &err.to_string(), Language::En);
        assert!(message.contains("took too long"));
    }
}
