//! Job repository: operations on the `processing_jobs` table.
//!
//! There is at most one job per (meeting, kind). Re-processing reuses it.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{now, Database, DatabaseError};
use crate::worker::job::{JobKind, JobStatus};

/// A processing job row with typed kind and status.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    pub id: i64,
    pub meeting_id: i64,
    pub kind: JobKind,
    pub status: JobStatus,
    pub result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// Column values as stored, before the kind is parsed.
struct RawJob {
    id: i64,
    meeting_id: i64,
    job_kind: String,
    status: String,
    result: Option<String>,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

impl RawJob {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            meeting_id: row.get("meeting_id")?,
            job_kind: row.get("job_kind")?,
            status: row.get("status")?,
            result: row.get("result")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completed_at: row.get("completed_at")?,
        })
    }

    fn into_job(self) -> Result<JobRow, DatabaseError> {
        let kind = self
            .job_kind
            .parse::<JobKind>()
            .map_err(|_| DatabaseError::InvalidColumn {
                column: "job_kind",
                value: self.job_kind.clone(),
            })?;
        Ok(JobRow {
            id: self.id,
            meeting_id: self.meeting_id,
            kind,
            status: JobStatus::parse(&self.status),
            result: self.result,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

/// Returns the job for (meeting, kind), creating a pending one if none exists.
pub fn find_or_create(
    db: &Database,
    meeting_id: i64,
    kind: JobKind,
) -> Result<JobRow, DatabaseError> {
    let timestamp = now();
    let raw = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processing_jobs (meeting_id, job_kind, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(meeting_id, job_kind) DO NOTHING",
            params![meeting_id, kind.as_str(), JobStatus::Pending.as_str(), timestamp],
        )?;
        let raw = conn.query_row(
            "SELECT * FROM processing_jobs WHERE meeting_id = ?1 AND job_kind = ?2",
            params![meeting_id, kind.as_str()],
            RawJob::from_row,
        )?;
        Ok(raw)
    })?;
    raw.into_job()
}

pub fn find_by_kind(
    db: &Database,
    meeting_id: i64,
    kind: JobKind,
) -> Result<Option<JobRow>, DatabaseError> {
    let raw = db.with_conn(|conn| {
        let raw = conn
            .query_row(
                "SELECT * FROM processing_jobs WHERE meeting_id = ?1 AND job_kind = ?2",
                params![meeting_id, kind.as_str()],
                RawJob::from_row,
            )
            .optional()?;
        Ok(raw)
    })?;
    raw.map(RawJob::into_job).transpose()
}

/// Moves a job to `status` and overwrites its result.
///
/// `completed_at` is stamped for terminal statuses and cleared otherwise, so
/// restarting a finished job leaves no stale completion time behind.
pub fn update_status(
    db: &Database,
    job_id: i64,
    status: JobStatus,
    result: Option<&str>,
) -> Result<(), DatabaseError> {
    let timestamp = now();
    let completed_at = status.is_terminal().then(|| timestamp.clone());
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE processing_jobs SET status = ?2, result = ?3, updated_at = ?4, completed_at = ?5
             WHERE id = ?1",
            params![job_id, status.as_str(), result, timestamp, completed_at],
        )?;
        Ok(())
    })
}

/// Replaces only the result text (used by translation).
pub fn update_result(db: &Database, job_id: i64, result: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE processing_jobs SET result = ?2, updated_at = ?3 WHERE id = ?1",
            params![job_id, result, now()],
        )?;
        Ok(())
    })
}

pub fn list_for_meeting(db: &Database, meeting_id: i64) -> Result<Vec<JobRow>, DatabaseError> {
    let raws = db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM processing_jobs WHERE meeting_id = ?1 ORDER BY id")?;
        let raws = stmt
            .query_map(params![meeting_id], RawJob::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(raws)
    })?;
    raws.into_iter().map(RawJob::into_job).collect()
}

/// Statuses of every job of a meeting, for deriving the meeting status.
pub fn statuses_for_meeting(
    db: &Database,
    meeting_id: i64,
) -> Result<Vec<JobStatus>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT status FROM processing_jobs WHERE meeting_id = ?1")?;
        let statuses = stmt
            .query_map(params![meeting_id], |row| row.get::<_, String>(0))?
            .map(|s| s.map(|s| JobStatus::parse(&s)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    })
}
