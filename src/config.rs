//! Board Configuration
//!
//! Read from a JSON file; every field is optional.
//!
//! ```json
//! { "database_path": "board.db", "insert_position": "back", "log_dir": "logs" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::DomainResult;
use crate::ordering::InsertPosition;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// SQLite file, or `":memory:"` for a private SQLite database.
    /// Without a path the board lives in the in-memory store.
    pub database_path: Option<PathBuf>,
    /// Where new items go when no order is requested
    pub insert_position: InsertPosition,
    /// Directory for rolling log files; logging stays off without one
    pub log_dir: Option<PathBuf>,
}

impl BoardConfig {
    pub fn load(path: &Path) -> DomainResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }
}
