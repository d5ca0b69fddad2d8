//! Test harness for isolated orchestrator runs.
//!
//! Each harness owns a temporary directory for artifacts and an in-memory
//! database, and drives a [`JobOrchestrator`] built over stub providers.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use meetscribe::db::meeting_repo::{self, MeetingRow, NewMeeting};
use meetscribe::{
    Database, JobKind, JobOrchestrator, JobProgressBroadcaster, JobResult, Language,
    ProcessingRequest,
};

use super::builders::PipelineBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    pub orchestrator: JobOrchestrator,
    pub progress: JobProgressBroadcaster,
}

impl TestHarness {
    /// Harness with a 5 MB synchronous limit.
    pub fn new(pipeline: PipelineBuilder) -> Self {
        Self::with_sync_limit(pipeline, 5 * 1024 * 1024)
    }

    pub fn with_sync_limit(pipeline: PipelineBuilder, sync_max_bytes: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to open test database");
        let progress = JobProgressBroadcaster::default();
        let orchestrator = JobOrchestrator::new(db, Arc::new(pipeline.build()), sync_max_bytes)
            .with_progress(progress.clone());

        Self {
            temp_dir,
            orchestrator,
            progress,
        }
    }

    pub fn db(&self) -> &Database {
        self.orchestrator.db()
    }

    /// Writes an artifact file into the harness directory.
    pub fn write_artifact(&self, filename: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(filename);
        std::fs::write(&path, bytes).expect("Failed to write artifact");
        path
    }

    /// Stores `bytes` as a file and registers a meeting for it.
    pub fn meeting_with_file(&self, filename: &str, media_type: &str, bytes: &[u8]) -> i64 {
        let path = self.write_artifact(filename, bytes);
        meeting_repo::insert(
            self.db(),
            &NewMeeting {
                title: Some(format!("Meeting for {}", filename)),
                artifact_path: Some(path.to_string_lossy().into_owned()),
                filename: Some(filename.to_string()),
                media_type: Some(media_type.to_string()),
                byte_size: Some(bytes.len() as u64),
                ..Default::default()
            },
        )
        .expect("Failed to insert meeting")
        .id
    }

    pub fn meeting_with_text(&self, text: &str) -> i64 {
        self.meeting_with_file("notes.txt", "text/plain", text.as_bytes())
    }

    pub fn meeting(&self, id: i64) -> MeetingRow {
        meeting_repo::find_by_id(self.db(), id)
            .expect("Failed to query meeting")
            .expect("Meeting not found")
    }

    /// Runs a job in the background and waits for its result.
    pub async fn process(&self, meeting_id: i64, kind: JobKind, language: Language) -> JobResult {
        self.orchestrator
            .request_processing(ProcessingRequest::new(meeting_id, kind, language))
            .expect("Failed to queue job")
            .await
            .expect("Job task panicked")
    }
}
