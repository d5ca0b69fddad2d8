//! Stored business contexts (templates and knowledge-base entries) that can be
//! attached to a generation request.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{now, Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Template,
    KnowledgeBase,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Template => "template",
            ContextType::KnowledgeBase => "knowledge_base",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(ContextType::Template),
            "knowledge_base" => Ok(ContextType::KnowledgeBase),
            other => Err(format!(
                "invalid context type '{}', expected template or knowledge_base",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextRow {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub context_type: ContextType,
    pub created_at: String,
    pub updated_at: String,
}

impl ContextRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let context_type: String = row.get("context_type")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            content: row.get("content")?,
            // The CHECK constraint keeps other values out of the table.
            context_type: context_type.parse().unwrap_or(ContextType::Template),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub fn insert(
    db: &Database,
    name: &str,
    content: &str,
    context_type: ContextType,
) -> Result<ContextRow, DatabaseError> {
    let timestamp = now();
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO business_contexts (name, content, context_type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, content, context_type.as_str(), timestamp],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    Ok(ContextRow {
        id,
        name: name.to_string(),
        content: content.to_string(),
        context_type,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ContextRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM business_contexts WHERE id = ?1",
                params![id],
                ContextRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists contexts ordered by name, optionally restricted to one type.
pub fn list(
    db: &Database,
    context_type: Option<ContextType>,
) -> Result<Vec<ContextRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM business_contexts
             WHERE ?1 IS NULL OR context_type = ?1
             ORDER BY name, id",
        )?;
        let rows = stmt
            .query_map(
                params![context_type.map(|t| t.as_str())],
                ContextRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
