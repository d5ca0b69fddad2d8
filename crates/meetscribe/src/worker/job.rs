use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;
use crate::generation::Language;

/// The requested output document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Proposal,
    JiraTicket,
    ExecutiveSummary,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [
        JobKind::Proposal,
        JobKind::JiraTicket,
        JobKind::ExecutiveSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Proposal => "proposal",
            JobKind::JiraTicket => "jira_ticket",
            JobKind::ExecutiveSummary => "executive_summary",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposal" | "technical_proposal" => Ok(JobKind::Proposal),
            "jira_ticket" => Ok(JobKind::JiraTicket),
            "executive_summary" => Ok(JobKind::ExecutiveSummary),
            other => Err(OrchestratorError::InvalidRequest(format!(
                "invalid job kind '{}', expected one of: proposal, jira_ticket, executive_summary",
                other
            ))),
        }
    }
}

/// Processing job lifecycle. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parses a stored status string, defaulting unknown values to `Pending`.
    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "pending" => JobStatus::Pending,
            other => {
                log::warn!("Unknown job status '{}', defaulting to pending", other);
                JobStatus::Pending
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall meeting status, derived from its jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => MeetingStatus::Processing,
            "completed" => MeetingStatus::Completed,
            "failed" => MeetingStatus::Failed,
            _ => MeetingStatus::Pending,
        }
    }

    /// Completed only when every job is completed; failed as soon as any job failed.
    pub fn derive(job_statuses: &[JobStatus]) -> Self {
        if job_statuses.is_empty() {
            return MeetingStatus::Pending;
        }
        if job_statuses.iter().any(|s| *s == JobStatus::Failed) {
            return MeetingStatus::Failed;
        }
        if job_statuses.iter().all(|s| *s == JobStatus::Completed) {
            return MeetingStatus::Completed;
        }
        if job_statuses.iter().any(|s| *s == JobStatus::Processing) {
            return MeetingStatus::Processing;
        }
        MeetingStatus::Pending
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to (re)process one job kind for a meeting.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub meeting_id: i64,
    pub kind: JobKind,
    pub language: Language,
    /// Optional stored business context to include in the prompt.
    pub business_context_id: Option<i64>,
}

impl ProcessingRequest {
    pub fn new(meeting_id: i64, kind: JobKind, language: Language) -> Self {
        Self {
            meeting_id,
            kind,
            language,
            business_context_id: None,
        }
    }

    pub fn with_business_context(mut self, context_id: i64) -> Self {
        self.business_context_id = Some(context_id);
        self
    }
}

/// Terminal outcome of one job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: i64,
    pub meeting_id: i64,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Generated document, guidance text or classified error message.
    pub result: String,
    pub strategy: &'static str,
}

impl JobResult {
    pub fn success(
        job_id: i64,
        request: &ProcessingRequest,
        result: String,
        strategy: &'static str,
    ) -> Self {
        Self {
            job_id,
            meeting_id: request.meeting_id,
            kind: request.kind,
            status: JobStatus::Completed,
            result,
            strategy,
        }
    }

    pub fn failure(
        job_id: i64,
        request: &ProcessingRequest,
        error: String,
        strategy: &'static str,
    ) -> Self {
        Self {
            job_id,
            meeting_id: request.meeting_id,
            kind: request.kind,
            status: JobStatus::Failed,
            result: error,
            strategy,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
