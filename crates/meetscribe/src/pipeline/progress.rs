//! Progress notifications for running jobs.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::worker::job::JobKind;

/// Phase of job processing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    Extracting,
    Transcribing,
    Chunking,
    Generating,
    Completed,
    Failed,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "Queued"),
            JobPhase::Extracting => write!(f, "Extracting content"),
            JobPhase::Transcribing => write!(f, "Transcribing"),
            JobPhase::Chunking => write!(f, "Processing chunks"),
            JobPhase::Generating => write!(f, "Generating"),
            JobPhase::Completed => write!(f, "Completed"),
            JobPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Events emitted by the pipeline during processing.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase { phase: JobPhase, message: String },
    Completed { strategy: &'static str },
    Failed { error: String },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Progress event as seen by subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub meeting_id: i64,
    pub kind: JobKind,
    pub phase: JobPhase,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Strategy that produced the result (set on completion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    fn new(meeting_id: i64, kind: JobKind, phase: JobPhase, message: String) -> Self {
        Self {
            meeting_id,
            kind,
            phase,
            message,
            timestamp: Utc::now(),
            strategy: None,
            error: None,
        }
    }
}

/// Fan-out channel for job progress. Cloning shares the channel.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }

    /// Creates a reporter for one job and announces it as queued.
    pub fn start_job(&self, meeting_id: i64, kind: JobKind) -> BroadcastProgress {
        let reporter = BroadcastProgress {
            meeting_id,
            kind,
            sender: Arc::clone(&self.sender),
        };
        reporter.report(ProgressEvent::Phase {
            phase: JobPhase::Queued,
            message: "Job queued for processing".to_string(),
        });
        reporter
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Bridges pipeline events of one job onto the broadcast channel.
pub struct BroadcastProgress {
    meeting_id: i64,
    kind: JobKind,
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        let event = match event {
            ProgressEvent::Phase { phase, message } => {
                JobProgressEvent::new(self.meeting_id, self.kind, phase, message)
            }
            ProgressEvent::Completed { strategy } => {
                let mut e = JobProgressEvent::new(
                    self.meeting_id,
                    self.kind,
                    JobPhase::Completed,
                    "Processing completed".to_string(),
                );
                e.strategy = Some(strategy.to_string());
                e
            }
            ProgressEvent::Failed { error } => {
                let mut e = JobProgressEvent::new(
                    self.meeting_id,
                    self.kind,
                    JobPhase::Failed,
                    "Processing failed".to_string(),
                );
                e.error = Some(error);
                e
            }
        };
        // No active receivers is fine
        let _ = self.sender.send(event);
    }
}
