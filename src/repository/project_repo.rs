//! Project Repository
//!
//! SQLite-backed CRUD for projects.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::db::{format_date, inserted_id, not_initialized, now_millis, parse_date, SharedConnection};
use super::traits::Repository;
use crate::domain::{DomainError, DomainResult, Project};

const PROJECT_COLUMNS: &str = "id, name, description, is_favorite, deadline, accent_color, icon, show_completed_tasks, created_at, updated_at";

/// SQLite implementation of Project repository
pub struct ProjectRepository {
    conn: SharedConnection,
}

impl ProjectRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Project> for ProjectRepository {
    async fn create(&self, entity: &Project) -> DomainResult<Project> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = now_millis();
        conn.execute(
            "INSERT INTO projects (name, description, is_favorite, deadline, accent_color, icon, show_completed_tasks, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                entity.name,
                entity.description,
                entity.is_favorite,
                format_date(entity.deadline),
                entity.accent_color,
                entity.icon,
                entity.show_completed_tasks,
                now,
            ],
        )?;

        let mut project = entity.clone();
        project.id = inserted_id(conn)?;
        project.created_at = Some(now);
        project.updated_at = Some(now);
        Ok(project)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Project>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.query_row(
            &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
            params![id],
            |row| Ok(row_to_project(row)),
        )
        .optional()?
        .transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Project>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare(&format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS))?;
        let mut rows = stmt.query([])?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(row_to_project(row)?);
        }
        Ok(projects)
    }

    async fn update(&self, entity: &Project) -> DomainResult<Project> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = now_millis();
        let changed = conn.execute(
            "UPDATE projects SET name = ?1, description = ?2, is_favorite = ?3, deadline = ?4, accent_color = ?5, icon = ?6,
             show_completed_tasks = ?7, updated_at = ?8 WHERE id = ?9",
            params![
                entity.name,
                entity.description,
                entity.is_favorite,
                format_date(entity.deadline),
                entity.accent_color,
                entity.icon,
                entity.show_completed_tasks,
                now,
                entity.id,
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("project", entity.id));
        }

        let mut project = entity.clone();
        project.updated_at = Some(now);
        Ok(project)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found("project", id));
        }
        Ok(())
    }
}

/// Convert a database row to Project
fn row_to_project(row: &rusqlite::Row) -> DomainResult<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_favorite: row.get(3)?,
        deadline: parse_date("deadline", row.get(4)?)?,
        accent_color: row.get(5)?,
        icon: row.get(6)?,
        show_completed_tasks: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
