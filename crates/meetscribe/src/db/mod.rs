//! SQLite persistence for meetings, processing jobs and business contexts.
//!
//! Meetings own their jobs (`ON DELETE CASCADE`), and each job row is keyed by
//! `(meeting_id, job_kind)`, so reprocessing updates rather than appends.
//! Orchestrator tasks share one `Mutex<Connection>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod context_repo;
pub mod error;
pub mod job_repo;
pub mod meeting_repo;
pub mod migrations;

pub use error::DatabaseError;

/// Handle shared by the orchestrator, its spawned job tasks and the CLI.
///
/// Clones point at the same connection. File-backed databases run in WAL
/// mode so `meetscribe status` can read while a job task writes.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the meetscribe database at `path`, creating its parent
    /// directory and applying any migrations the file has not seen yet.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fresh in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection locked. Repository functions are built on
    /// this; a poisoned lock surfaces as [`DatabaseError::LockPoisoned`].
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.meetscribe/data/meetscribe.db`
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".meetscribe").join("data").join("meetscribe.db"))
}

/// Current UTC time in the format stored in timestamp columns.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
