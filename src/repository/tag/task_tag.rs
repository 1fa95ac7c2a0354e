//! Task-Tag Relationship Operations

use async_trait::async_trait;
use rusqlite::params;

use super::tag_repo::{row_to_tag, TagRepository};
use crate::domain::{DomainError, DomainResult, Tag, Task};
use crate::repository::db::{ensure_exists, not_initialized};
use crate::repository::task_repo::{query_tasks, TASK_COLUMNS};
use crate::repository::traits::TaskTagOperations;

#[async_trait]
impl TaskTagOperations for TagRepository {
    async fn add_tag_to_task(&self, task_id: u32, tag_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_exists(conn, "tasks", "task", task_id)?;
        ensure_exists(conn, "tags", "tag", tag_id)?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
            params![task_id, tag_id],
        )?;
        if inserted == 0 {
            return Err(DomainError::Conflict(format!(
                "task {} already has tag {}",
                task_id, tag_id
            )));
        }
        Ok(())
    }

    async fn remove_tag_from_task(&self, task_id: u32, tag_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let removed = conn.execute(
            "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
            params![task_id, tag_id],
        )?;
        if removed == 0 {
            return Err(DomainError::NotFound(format!(
                "task {} has no tag {}",
                task_id, tag_id
            )));
        }
        Ok(())
    }

    async fn tags_for_task(&self, task_id: u32) -> DomainResult<Vec<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_exists(conn, "tasks", "task", task_id)?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.color FROM tags t
             JOIN task_tags tt ON t.id = tt.tag_id
             WHERE tt.task_id = ?1
             ORDER BY t.name COLLATE NOCASE",
        )?;
        let tags = stmt
            .query_map(params![task_id], row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn tasks_with_tag(&self, tag_id: u32) -> DomainResult<Vec<Task>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_exists(conn, "tags", "tag", tag_id)?;
        let sql = format!(
            "SELECT {} FROM tasks WHERE id IN (SELECT task_id FROM task_tags WHERE tag_id = ?1) ORDER BY id",
            TASK_COLUMNS
        );
        query_tasks(conn, &sql, params![tag_id])
    }
}
