//! Database Connection and Setup
//!
//! Manages the SQLite connection, migrations and transaction boundaries.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::Transactional;
use crate::domain::{DomainError, DomainResult};

/// Connection handle shared by all SQLite repositories
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Path that selects a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Base schema. Columns added after the first release are applied by
/// `run_migrations` so existing databases pick them up too.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        is_favorite INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER,
        updated_at INTEGER
    );

    CREATE TABLE IF NOT EXISTS sections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER,
        updated_at INTEGER
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        position INTEGER NOT NULL DEFAULT 0,
        project_id INTEGER REFERENCES projects(id),
        section_id INTEGER REFERENCES sections(id),
        parent_task_id INTEGER REFERENCES tasks(id),
        is_done INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER,
        updated_at INTEGER,
        CHECK ((project_id IS NOT NULL) + (section_id IS NOT NULL) + (parent_task_id IS NOT NULL) = 1)
    );

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        color TEXT
    );

    CREATE TABLE IF NOT EXISTS task_tags (
        task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (task_id, tag_id)
    );

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        body TEXT,
        reason TEXT,
        owner_id INTEGER,
        project_id INTEGER REFERENCES projects(id) ON DELETE CASCADE,
        task_id INTEGER REFERENCES tasks(id) ON DELETE CASCADE,
        parent_comment_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
        created_at INTEGER,
        updated_at INTEGER,
        CHECK ((project_id IS NOT NULL) + (task_id IS NOT NULL) = 1)
    );

    CREATE TABLE IF NOT EXISTS reactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        emoji TEXT NOT NULL,
        task_id INTEGER REFERENCES tasks(id) ON DELETE CASCADE,
        comment_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
        created_at INTEGER,
        CHECK ((task_id IS NOT NULL) + (comment_id IS NOT NULL) = 1)
    );

    CREATE TABLE IF NOT EXISTS reaction_users (
        reaction_id INTEGER NOT NULL REFERENCES reactions(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL,
        PRIMARY KEY (reaction_id, user_id)
    );

    CREATE INDEX IF NOT EXISTS idx_sections_project ON sections(project_id, position);
    CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id, position);
    CREATE INDEX IF NOT EXISTS idx_tasks_section ON tasks(section_id, position);
    CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_task_id, position);
    CREATE INDEX IF NOT EXISTS idx_comments_project ON comments(project_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_comments_task ON comments(task_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment_id);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_reactions_task ON reactions(task_id, emoji) WHERE task_id IS NOT NULL;
    CREATE UNIQUE INDEX IF NOT EXISTS idx_reactions_comment ON reactions(comment_id, emoji) WHERE comment_id IS NOT NULL;
";

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

pub(crate) fn not_initialized() -> DomainError {
    DomainError::Internal("Database not initialized".to_string())
}

/// Current time in unix milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Storage format of date columns
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

/// Parse a stored date. A value that is present but malformed is corruption,
/// not an absent date.
pub(crate) fn parse_date(column: &str, value: Option<String>) -> DomainResult<Option<NaiveDate>> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
                DomainError::Internal(format!("invalid {} '{}': {}", column, raw, e))
            })
        })
        .transpose()
}

/// Id of the row inserted last on this connection
pub(crate) fn inserted_id(conn: &Connection) -> DomainResult<u32> {
    let rowid = conn.last_insert_rowid();
    u32::try_from(rowid)
        .map_err(|_| DomainError::Internal(format!("row id {} does not fit in u32", rowid)))
}

/// `NotFound` unless `table` has a row with `id`
pub(crate) fn ensure_exists(conn: &Connection, table: &str, entity: &str, id: u32) -> DomainResult<()> {
    let found: Option<u32> = conn
        .query_row(&format!("SELECT id FROM {} WHERE id = ?1", table), params![id], |row| row.get(0))
        .optional()?;
    found.map(|_| ()).ok_or_else(|| DomainError::not_found(entity, id))
}

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
    path: PathBuf,
}

impl DbState {
    /// Create an empty state; `init_db` fills in the connection
    pub fn new(path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection. Repositories report "not initialized" afterwards.
    pub async fn close(&self) {
        *self.conn.lock().await = None;
    }

    async fn execute_batch(&self, sql: &str) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl Transactional for DbState {
    async fn begin(&self) -> DomainResult<()> {
        debug!("BEGIN IMMEDIATE");
        self.execute_batch("BEGIN IMMEDIATE").await
    }

    async fn commit(&self) -> DomainResult<()> {
        debug!("COMMIT");
        self.execute_batch("COMMIT").await
    }

    async fn rollback(&self) -> DomainResult<()> {
        debug!("ROLLBACK");
        self.execute_batch("ROLLBACK").await
    }
}

/// Open (or create) the database at `db_path` and bring its schema up to date
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = if db_path == Path::new(IN_MEMORY) {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Connection::open(db_path)?
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    run_migrations(&conn)?;
    info!("database ready at {}", db_path.display());

    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(SCHEMA)?;

    let added_columns = [
        ("sections", "is_collapsed", "INTEGER NOT NULL DEFAULT 0"),
        ("tasks", "done_at", "INTEGER"),
        ("tasks", "deadline", "TEXT"),
        ("projects", "deadline", "TEXT"),
        ("projects", "accent_color", "TEXT"),
        ("projects", "icon", "TEXT"),
        ("projects", "show_completed_tasks", "INTEGER NOT NULL DEFAULT 0"),
    ];
    for (table, column, definition) in added_columns {
        if !column_exists(conn, table, column)? {
            conn.execute(
                &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition),
                [],
            )?;
            debug!("added column {}.{}", table, column);
        }
    }

    Ok(())
}
