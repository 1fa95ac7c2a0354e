//! Tag Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Tag CRUD operations.
//! Task-tag links live in `task_tag`.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{DomainError, DomainResult, Tag};
use crate::repository::db::{inserted_id, not_initialized, SharedConnection};
use crate::repository::traits::Repository;

/// SQLite implementation of Tag repository
pub struct TagRepository {
    pub(super) conn: SharedConnection,
}

impl TagRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

/// Reject a name already used by another tag.
/// SQLite's `lower()` only folds ASCII, so names are compared here.
fn ensure_unique_name(conn: &Connection, tag: &Tag) -> DomainResult<()> {
    let key = tag.name_key();
    let mut stmt = conn.prepare("SELECT name FROM tags WHERE id != ?1")?;
    let mut rows = stmt.query(params![tag.id])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        if Tag::normalize_name(&name) == key {
            return Err(DomainError::Conflict(format!("tag '{}' already exists", tag.name.trim())));
        }
    }
    Ok(())
}

#[async_trait]
impl Repository<Tag> for TagRepository {
    async fn create(&self, entity: &Tag) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_unique_name(conn, entity)?;
        conn.execute(
            "INSERT INTO tags (name, color) VALUES (?1, ?2)",
            params![entity.name.trim(), entity.color],
        )?;

        let mut tag = entity.clone();
        tag.id = inserted_id(conn)?;
        tag.name = entity.name.trim().to_string();
        Ok(tag)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let tag = conn
            .query_row("SELECT id, name, color FROM tags WHERE id = ?1", params![id], row_to_tag)
            .optional()?;
        Ok(tag)
    }

    async fn list(&self) -> DomainResult<Vec<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare("SELECT id, name, color FROM tags ORDER BY name COLLATE NOCASE")?;
        let tags = stmt.query_map([], row_to_tag)?.collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn update(&self, entity: &Tag) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_unique_name(conn, entity)?;
        let changed = conn.execute(
            "UPDATE tags SET name = ?1, color = ?2 WHERE id = ?3",
            params![entity.name.trim(), entity.color, entity.id],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("tag", entity.id));
        }

        let mut tag = entity.clone();
        tag.name = entity.name.trim().to_string();
        Ok(tag)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        // task_tags rows go with it (ON DELETE CASCADE)
        let changed = conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found("tag", id));
        }
        Ok(())
    }
}

/// Convert a database row to Tag
pub(super) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}
