//! End-to-end orchestrator runs over artifacts stored on disk.

mod common;

use std::sync::Arc;

use tokio::sync::Semaphore;

use common::{
    build_pdf, numbered_paragraphs, PipelineBuilder, RecordingProvider, TestHarness, MEETING,
};
use meetscribe::db::job_repo;
use meetscribe::generation::DEGRADED_MARKER;
use meetscribe::pipeline::JobPhase;
use meetscribe::{
    JobKind, JobStatus, Language, MeetingStatus, MeetscribeError, OrchestratorError,
    ProcessingRequest,
};

#[tokio::test]
async fn test_text_meeting_completes_all_kinds() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let meeting_id = harness.meeting_with_text(MEETING);

    for kind in JobKind::ALL {
        let result = harness.process(meeting_id, kind, Language::En).await;
        assert!(result.is_success(), "{} failed: {}", kind, result.result);
        assert_eq!(result.strategy, "direct");
    }

    let snapshot = harness.orchestrator.status(meeting_id).unwrap();
    assert_eq!(snapshot.meeting.status, MeetingStatus::Completed);
    assert_eq!(snapshot.jobs.len(), 3);
    assert!(snapshot
        .jobs
        .iter()
        .all(|j| j.status == JobStatus::Completed && j.completed_at.is_some()));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_reprocessing_reuses_the_job_row() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let meeting_id = harness.meeting_with_text(MEETING);

    let first = harness.process(meeting_id, JobKind::Proposal, Language::En).await;
    let second = harness.process(meeting_id, JobKind::Proposal, Language::En).await;

    assert_eq!(first.job_id, second.job_id);
    let job = job_repo::find_by_kind(harness.db(), meeting_id, JobKind::Proposal)
        .unwrap()
        .unwrap();
    assert_eq!(job.result.as_deref(), Some(second.result.as_str()));
    assert!(job.result.unwrap().starts_with("Summary 2:"));
}

#[tokio::test]
async fn test_pdf_without_text_layer_completes_with_guidance() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let pdf = build_pdf(&["ten chars!"]);
    let meeting_id = harness.meeting_with_file("scan.pdf", "application/pdf", &pdf);

    let result = harness
        .process(meeting_id, JobKind::ExecutiveSummary, Language::Es)
        .await;

    assert!(result.is_success());
    assert!(result.result.contains("PDF SIN TEXTO EXTRAÍBLE"));
    assert_eq!(provider.calls(), 0);
    assert_eq!(harness.meeting(meeting_id).status, MeetingStatus::Completed);
}

#[tokio::test]
async fn test_provider_outage_completes_in_basic_mode() {
    let provider = RecordingProvider::overloaded();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let meeting_id = harness.meeting_with_text(MEETING);

    let result = harness.process(meeting_id, JobKind::JiraTicket, Language::En).await;

    assert!(result.is_success());
    assert!(result.result.contains(DEGRADED_MARKER));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_large_text_is_chunked_in_order() {
    let provider = RecordingProvider::replying();
    let text = numbered_paragraphs(3);
    let harness = TestHarness::new(
        PipelineBuilder::new(provider.clone())
            .large_threshold(100)
            .max_chunk_chars(70),
    );
    let meeting_id = harness.meeting_with_text(&text);

    let result = harness
        .process(meeting_id, JobKind::ExecutiveSummary, Language::En)
        .await;
    assert!(result.is_success(), "{}", result.result);
    assert_eq!(result.strategy, "large_file");

    // three chunk summaries, one combine call, one final generation
    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 5);
    for (i, prompt) in prompts[..3].iter().enumerate() {
        assert!(prompt.contains(&format!("fragment {} of 3", i + 1)));
        assert!(prompt.contains(&format!("Paragraph {} covers", i + 1)));
    }

    let combine = &prompts[3];
    let first = combine.find("Summary 1:").unwrap();
    let second = combine.find("Summary 2:").unwrap();
    let third = combine.find("Summary 3:").unwrap();
    assert!(first < second && second < third);

    assert!(prompts[4].contains("Summary 4:"));
    assert!(result.result.starts_with("Summary 5:"));
}

#[tokio::test]
async fn test_large_scanned_pdf_completes_with_guidance() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()).large_threshold(100));
    let pdf = build_pdf(&["ten chars!"]);
    let meeting_id = harness.meeting_with_file("scan.pdf", "application/pdf", &pdf);

    let result = harness
        .process(meeting_id, JobKind::ExecutiveSummary, Language::Es)
        .await;

    assert!(result.is_success());
    assert_eq!(result.strategy, "large_file");
    assert!(result.result.contains("PDF SIN TEXTO EXTRAÍBLE"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_file_over_hard_cap_fails_job_and_meeting() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(
        PipelineBuilder::new(provider.clone())
            .large_threshold(100)
            .max_file_bytes(200),
    );
    let meeting_id = harness.meeting_with_text(MEETING);

    let result = harness.process(meeting_id, JobKind::Proposal, Language::En).await;

    assert!(!result.is_success());
    assert_eq!(result.strategy, "large_file");
    let job = job_repo::find_by_kind(harness.db(), meeting_id, JobKind::Proposal)
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.result.as_deref(), Some(result.result.as_str()));
    assert_eq!(harness.meeting(meeting_id).status, MeetingStatus::Failed);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_second_request_while_running_is_rejected() {
    let gate = Arc::new(Semaphore::new(0));
    let provider = RecordingProvider::blocking(gate.clone());
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let meeting_id = harness.meeting_with_text(MEETING);

    let request = ProcessingRequest::new(meeting_id, JobKind::Proposal, Language::En);
    let handle = harness
        .orchestrator
        .request_processing(request.clone())
        .unwrap();

    let err = harness
        .orchestrator
        .request_processing(request.clone())
        .unwrap_err();
    assert!(matches!(
        err,
        MeetscribeError::Orchestrator(OrchestratorError::AlreadyInFlight { .. })
    ));

    // translation of the same job is serialized behind the run as well
    let err = harness
        .orchestrator
        .translate_job(meeting_id, JobKind::Proposal, Language::Es)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MeetscribeError::Orchestrator(OrchestratorError::AlreadyInFlight { .. })
    ));

    // a different kind of the same meeting is independent
    let other = harness
        .orchestrator
        .request_processing(ProcessingRequest::new(
            meeting_id,
            JobKind::JiraTicket,
            Language::En,
        ))
        .unwrap();

    gate.add_permits(2);
    assert!(handle.await.unwrap().is_success());
    assert!(other.await.unwrap().is_success());

    // released once finished
    let again = harness.orchestrator.request_processing(request).unwrap();
    gate.add_permits(1);
    assert!(again.await.unwrap().is_success());
}

#[tokio::test]
async fn test_progress_events_follow_job_phases() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider));
    let mut events = harness.progress.subscribe();
    let meeting_id = harness.meeting_with_text(MEETING);

    harness.process(meeting_id, JobKind::Proposal, Language::En).await;

    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.meeting_id, meeting_id);
        assert_eq!(event.kind, JobKind::Proposal);
        phases.push(event.phase);
    }
    assert_eq!(
        phases,
        vec![
            JobPhase::Queued,
            JobPhase::Extracting,
            JobPhase::Generating,
            JobPhase::Completed,
        ]
    );
}

#[tokio::test]
async fn test_missing_artifact_fails_job_and_meeting() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let meeting_id = harness.meeting_with_text(MEETING);
    std::fs::remove_file(harness.write_artifact("notes.txt", b"")).unwrap();

    let result = harness.process(meeting_id, JobKind::Proposal, Language::En).await;

    assert!(!result.is_success());
    assert_eq!(harness.meeting(meeting_id).status, MeetingStatus::Failed);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_translate_overwrites_stored_result() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::new(PipelineBuilder::new(provider.clone()));
    let meeting_id = harness.meeting_with_text(MEETING);
    harness.process(meeting_id, JobKind::ExecutiveSummary, Language::En).await;

    let translated = harness
        .orchestrator
        .translate_job(meeting_id, JobKind::ExecutiveSummary, Language::Es)
        .await
        .unwrap();
    assert!(translated.starts_with("Summary 2:"));

    let job = job_repo::find_by_kind(harness.db(), meeting_id, JobKind::ExecutiveSummary)
        .unwrap()
        .unwrap();
    assert_eq!(job.result.as_deref(), Some(translated.as_str()));
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_sync_run_respects_size_limit() {
    let provider = RecordingProvider::replying();
    let harness = TestHarness::with_sync_limit(PipelineBuilder::new(provider.clone()), 64);
    let small = harness.meeting_with_file("short.txt", "text/plain", MEETING[..60].as_bytes());
    let large = harness.meeting_with_text(MEETING);

    let err = harness
        .orchestrator
        .run_sync(ProcessingRequest::new(large, JobKind::Proposal, Language::En))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MeetscribeError::Orchestrator(OrchestratorError::TooLargeForSync { limit: 64, .. })
    ));

    let result = harness
        .orchestrator
        .run_sync(ProcessingRequest::new(small, JobKind::Proposal, Language::En))
        .await
        .unwrap();
    // 60 characters pass the length check but not the word count
    assert!(result.is_success());
    assert_eq!(provider.calls(), 0);
}
