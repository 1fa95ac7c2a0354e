//! Task Repository
//!
//! SQLite-backed storage for tasks. A task's placement is stored in the three
//! columns `project_id`, `section_id` and `parent_task_id`; the schema's CHECK
//! constraint keeps exactly one of them set.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Params};

use super::db::{format_date, inserted_id, not_initialized, now_millis, parse_date, SharedConnection};
use super::traits::{PositionedRepository, Repository};
use crate::domain::{ContainerRef, DomainError, DomainResult, Task};

pub(crate) const TASK_COLUMNS: &str = "id, name, description, position, project_id, section_id, parent_task_id, is_done, done_at, deadline, created_at, updated_at";

/// SQLite implementation of Task repository
pub struct TaskRepository {
    conn: SharedConnection,
}

impl TaskRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

/// Column holding the placement for a container kind
fn container_column(container: ContainerRef) -> &'static str {
    match container {
        ContainerRef::Project(_) => "project_id",
        ContainerRef::Section(_) => "section_id",
        ContainerRef::Task(_) => "parent_task_id",
    }
}

/// Run a task query and map every row
pub(crate) fn query_tasks<P: Params>(conn: &Connection, sql: &str, params: P) -> DomainResult<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(row_to_task(row)?);
    }
    Ok(tasks)
}

#[async_trait]
impl Repository<Task> for TaskRepository {
    async fn create(&self, entity: &Task) -> DomainResult<Task> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = now_millis();
        let deadline = format_date(entity.deadline);
        conn.execute(
            "INSERT INTO tasks (name, description, position, project_id, section_id, parent_task_id, is_done, done_at, deadline, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                entity.name,
                entity.description,
                entity.order,
                entity.project_id(),
                entity.section_id(),
                entity.parent_task_id(),
                entity.is_done,
                entity.done_at,
                deadline,
                now,
            ],
        )?;

        let mut task = entity.clone();
        task.id = inserted_id(conn)?;
        task.created_at = Some(now);
        task.updated_at = Some(now);
        Ok(task)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Task>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![id],
            |row| Ok(row_to_task(row)),
        )
        .optional()?
        .transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Task>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        query_tasks(conn, &format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS), params![])
    }

    async fn update(&self, entity: &Task) -> DomainResult<Task> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = now_millis();
        let deadline = format_date(entity.deadline);
        let changed = conn.execute(
            "UPDATE tasks SET name = ?1, description = ?2, position = ?3, project_id = ?4, section_id = ?5, parent_task_id = ?6,
             is_done = ?7, done_at = ?8, deadline = ?9, updated_at = ?10 WHERE id = ?11",
            params![
                entity.name,
                entity.description,
                entity.order,
                entity.project_id(),
                entity.section_id(),
                entity.parent_task_id(),
                entity.is_done,
                entity.done_at,
                deadline,
                now,
                entity.id,
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("task", entity.id));
        }

        let mut task = entity.clone();
        task.updated_at = Some(now);
        Ok(task)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        // Subtasks keep a foreign key to this row; callers remove them first
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found("task", id));
        }
        Ok(())
    }
}

#[async_trait]
impl PositionedRepository<Task> for TaskRepository {
    async fn children_of(&self, container: ContainerRef) -> DomainResult<Vec<Task>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let sql = format!(
            "SELECT {} FROM tasks WHERE {} = ?1 ORDER BY position, id",
            TASK_COLUMNS,
            container_column(container)
        );
        query_tasks(conn, &sql, params![container.id()])
    }

    async fn set_order(&self, id: u32, order: i32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn.execute(
            "UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3",
            params![order, now_millis(), id],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("task", id));
        }
        Ok(())
    }
}

/// Convert a database row to Task
pub(crate) fn row_to_task(row: &rusqlite::Row) -> DomainResult<Task> {
    let container = ContainerRef::from_columns(row.get(4)?, row.get(5)?, row.get(6)?)?;
    let deadline = parse_date("deadline", row.get(9)?)?;

    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        order: row.get(3)?,
        container,
        is_done: row.get(7)?,
        done_at: row.get(8)?,
        deadline,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
