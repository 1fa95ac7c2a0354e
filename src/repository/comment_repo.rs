//! Comment Repository
//!
//! SQLite-backed storage for threaded comments. Replies and reactions are
//! removed with their comment by `ON DELETE CASCADE`, and comments go with
//! the project or task they are attached to.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Params};

use super::db::{ensure_exists, inserted_id, not_initialized, now_millis, SharedConnection};
use super::traits::{CommentOperations, Repository};
use crate::domain::{Comment, CommentTarget, DomainError, DomainResult};

const COMMENT_COLUMNS: &str =
    "id, body, reason, owner_id, project_id, task_id, parent_comment_id, created_at, updated_at";

/// SQLite implementation of Comment repository
pub struct CommentRepository {
    conn: SharedConnection,
}

impl CommentRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

fn ensure_target(conn: &Connection, target: CommentTarget) -> DomainResult<()> {
    match target {
        CommentTarget::Project(id) => ensure_exists(conn, "projects", "project", id),
        CommentTarget::Task(id) => ensure_exists(conn, "tasks", "task", id),
    }
}

fn query_comments<P: Params>(conn: &Connection, sql: &str, params: P) -> DomainResult<Vec<Comment>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(row_to_comment(row)?);
    }
    Ok(comments)
}

#[async_trait]
impl Repository<Comment> for CommentRepository {
    async fn create(&self, entity: &Comment) -> DomainResult<Comment> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_target(conn, entity.target)?;
        if let Some(parent_id) = entity.parent_comment_id {
            ensure_exists(conn, "comments", "comment", parent_id)?;
        }

        let now = now_millis();
        conn.execute(
            "INSERT INTO comments (body, reason, owner_id, project_id, task_id, parent_comment_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                entity.body,
                entity.reason,
                entity.owner_id,
                entity.target.project_id(),
                entity.target.task_id(),
                entity.parent_comment_id,
                now,
            ],
        )?;

        let mut comment = entity.clone();
        comment.id = inserted_id(conn)?;
        comment.created_at = Some(now);
        comment.updated_at = Some(now);
        Ok(comment)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Comment>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.query_row(
            &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
            params![id],
            |row| Ok(row_to_comment(row)),
        )
        .optional()?
        .transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Comment>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        query_comments(conn, &format!("SELECT {} FROM comments ORDER BY id", COMMENT_COLUMNS), params![])
    }

    async fn update(&self, entity: &Comment) -> DomainResult<Comment> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        // Target and thread are fixed at creation
        let now = now_millis();
        let changed = conn.execute(
            "UPDATE comments SET body = ?1, reason = ?2, updated_at = ?3 WHERE id = ?4",
            params![entity.body, entity.reason, now, entity.id],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("comment", entity.id));
        }

        let mut comment = entity.clone();
        comment.updated_at = Some(now);
        Ok(comment)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found("comment", id));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentOperations for CommentRepository {
    async fn comments_on(&self, target: CommentTarget) -> DomainResult<Vec<Comment>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let column = match target {
            CommentTarget::Project(_) => "project_id",
            CommentTarget::Task(_) => "task_id",
        };
        let sql = format!(
            "SELECT {} FROM comments WHERE {} = ?1 AND parent_comment_id IS NULL ORDER BY created_at, id",
            COMMENT_COLUMNS, column
        );
        query_comments(conn, &sql, params![target.id()])
    }

    async fn replies_to(&self, comment_id: u32) -> DomainResult<Vec<Comment>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let sql = format!(
            "SELECT {} FROM comments WHERE parent_comment_id = ?1 ORDER BY created_at, id",
            COMMENT_COLUMNS
        );
        query_comments(conn, &sql, params![comment_id])
    }
}

/// Convert a database row to Comment
fn row_to_comment(row: &rusqlite::Row) -> DomainResult<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        body: row.get(1)?,
        reason: row.get(2)?,
        owner_id: row.get(3)?,
        target: CommentTarget::from_columns(row.get(4)?, row.get(5)?)?,
        parent_comment_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
