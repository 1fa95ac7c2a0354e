//! Section Repository
//!
//! SQLite-backed storage for sections, ordered per project.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::db::{inserted_id, not_initialized, now_millis, SharedConnection};
use super::traits::{PositionedRepository, Repository};
use crate::domain::{ContainerRef, DomainError, DomainResult, Section};

const SECTION_COLUMNS: &str = "id, name, project_id, position, is_collapsed, created_at, updated_at";

/// SQLite implementation of Section repository
pub struct SectionRepository {
    conn: SharedConnection,
}

impl SectionRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Section> for SectionRepository {
    async fn create(&self, entity: &Section) -> DomainResult<Section> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = now_millis();
        conn.execute(
            "INSERT INTO sections (name, project_id, position, is_collapsed, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![entity.name, entity.project_id, entity.order, entity.is_collapsed, now],
        )?;

        let mut section = entity.clone();
        section.id = inserted_id(conn)?;
        section.created_at = Some(now);
        section.updated_at = Some(now);
        Ok(section)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Section>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let section = conn
            .query_row(
                &format!("SELECT {} FROM sections WHERE id = ?1", SECTION_COLUMNS),
                params![id],
                row_to_section,
            )
            .optional()?;
        Ok(section)
    }

    async fn list(&self) -> DomainResult<Vec<Section>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sections ORDER BY project_id, position, id",
            SECTION_COLUMNS
        ))?;
        let sections = stmt
            .query_map([], row_to_section)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }

    async fn update(&self, entity: &Section) -> DomainResult<Section> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = now_millis();
        let changed = conn.execute(
            "UPDATE sections SET name = ?1, project_id = ?2, position = ?3, is_collapsed = ?4, updated_at = ?5 WHERE id = ?6",
            params![entity.name, entity.project_id, entity.order, entity.is_collapsed, now, entity.id],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("section", entity.id));
        }

        let mut section = entity.clone();
        section.updated_at = Some(now);
        Ok(section)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn.execute("DELETE FROM sections WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found("section", id));
        }
        Ok(())
    }
}

#[async_trait]
impl PositionedRepository<Section> for SectionRepository {
    async fn children_of(&self, container: ContainerRef) -> DomainResult<Vec<Section>> {
        // Only projects hold sections
        let ContainerRef::Project(project_id) = container else {
            return Ok(Vec::new());
        };

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sections WHERE project_id = ?1 ORDER BY position, id",
            SECTION_COLUMNS
        ))?;
        let sections = stmt
            .query_map(params![project_id], row_to_section)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }

    async fn set_order(&self, id: u32, order: i32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn.execute(
            "UPDATE sections SET position = ?1, updated_at = ?2 WHERE id = ?3",
            params![order, now_millis(), id],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("section", id));
        }
        Ok(())
    }
}

/// Convert a database row to Section
fn row_to_section(row: &rusqlite::Row) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get(0)?,
        name: row.get(1)?,
        project_id: row.get(2)?,
        order: row.get(3)?,
        is_collapsed: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
