//! Meeting repository: CRUD operations for the `meetings` table.

use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{now, Database, DatabaseError};
use crate::worker::job::MeetingStatus;

const UNTITLED: &str = "Untitled meeting";

/// A meeting row from the database.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: MeetingStatus,
    pub artifact_path: Option<String>,
    pub filename: Option<String>,
    pub media_type: Option<String>,
    pub byte_size: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl MeetingRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: MeetingStatus::parse(&status),
            artifact_path: row.get("artifact_path")?,
            filename: row.get("filename")?,
            media_type: row.get("media_type")?,
            byte_size: row.get("byte_size")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Fields supplied when a meeting is created.
#[derive(Debug, Default, Clone)]
pub struct NewMeeting {
    pub title: Option<String>,
    pub description: Option<String>,
    pub artifact_path: Option<String>,
    pub filename: Option<String>,
    pub media_type: Option<String>,
    pub byte_size: Option<u64>,
}

impl NewMeeting {
    /// Blank titles fall back to the file name, then to a fixed placeholder.
    fn resolved_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.filename.as_deref())
            .unwrap_or(UNTITLED)
            .to_string()
    }
}

/// Inserts a meeting and returns the stored row.
pub fn insert(db: &Database, meeting: &NewMeeting) -> Result<MeetingRow, DatabaseError> {
    let title = meeting.resolved_title();
    let timestamp = now();
    let byte_size = meeting.byte_size.map(|s| s as i64);

    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO meetings (title, description, status, artifact_path, filename,
             media_type, byte_size, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                title,
                meeting.description,
                MeetingStatus::Pending.as_str(),
                meeting.artifact_path,
                meeting.filename,
                meeting.media_type,
                byte_size,
                timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    log::debug!("Inserted meeting {} ('{}')", id, title);

    Ok(MeetingRow {
        id,
        title,
        description: meeting.description.clone(),
        status: MeetingStatus::Pending,
        artifact_path: meeting.artifact_path.clone(),
        filename: meeting.filename.clone(),
        media_type: meeting.media_type.clone(),
        byte_size,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<MeetingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM meetings WHERE id = ?1",
                params![id],
                MeetingRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists meetings, newest first.
pub fn list(db: &Database, limit: Option<u64>) -> Result<Vec<MeetingRow>, DatabaseError> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM meetings ORDER BY created_at DESC, id DESC LIMIT ?1")?;
        let rows = stmt
            .query_map(params![limit], MeetingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns `false` if no meeting has the given id.
pub fn update_status(
    db: &Database,
    id: i64,
    status: MeetingStatus,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE meetings SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now()],
        )?;
        Ok(changed > 0)
    })
}

/// Deletes a meeting together with its jobs.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM meetings WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn with_file(filename: &str) -> NewMeeting {
        NewMeeting {
            artifact_path: Some(format!("/tmp/{}", filename)),
            filename: Some(filename.to_string()),
            media_type: Some("text/plain".to_string()),
            byte_size: Some(1200),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let inserted = insert(
            &db,
            &NewMeeting {
                title: Some("Kickoff".to_string()),
                ..with_file("kickoff.txt")
            },
        )
        .unwrap();

        let found = find_by_id(&db, inserted.id).unwrap().unwrap();
        assert_eq!(found.title, "Kickoff");
        assert_eq!(found.status, MeetingStatus::Pending);
        assert_eq!(found.filename.as_deref(), Some("kickoff.txt"));
        assert_eq!(found.byte_size, Some(1200));
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, 42).unwrap().is_none());
    }

    #[test]
    fn test_title_falls_back_to_filename() {
        let db = test_db();
        let meeting = insert(
            &db,
            &NewMeeting {
                title: Some("   ".to_string()),
                ..with_file("retro.pdf")
            },
        )
        .unwrap();
        assert_eq!(meeting.title, "retro.pdf");
    }

    #[test]
    fn test_untitled_without_file() {
        let db = test_db();
        let meeting = insert(&db, &NewMeeting::default()).unwrap();
        assert_eq!(meeting.title, "Untitled meeting");
    }

    #[test]
    fn test_update_status() {
        let db = test_db();
        let meeting = insert(&db, &with_file("a.txt")).unwrap();

        assert!(update_status(&db, meeting.id, MeetingStatus::Processing).unwrap());
        let found = find_by_id(&db, meeting.id).unwrap().unwrap();
        assert_eq!(found.status, MeetingStatus::Processing);

        assert!(!update_status(&db, 999, MeetingStatus::Failed).unwrap());
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        let db = test_db();
        insert(&db, &with_file("first.txt")).unwrap();
        insert(&db, &with_file("second.txt")).unwrap();
        insert(&db, &with_file("third.txt")).unwrap();

        let all = list(&db, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "third.txt");

        let limited = list(&db, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        let meeting = insert(&db, &with_file("gone.txt")).unwrap();
        assert!(delete(&db, meeting.id).unwrap());
        assert!(find_by_id(&db, meeting.id).unwrap().is_none());
        assert!(!delete(&db, meeting.id).unwrap());
    }
}
