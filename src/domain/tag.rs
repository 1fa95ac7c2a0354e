//! Tag Entity
//!
//! Tags can be attached to tasks for categorization and filtering.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// A tag for categorizing tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: u32,
    /// Tag name, unique ignoring case
    pub name: String,
    /// Color (hex, e.g., "#FF5733")
    pub color: Option<String>,
}

impl Tag {
    pub fn new(id: u32, name: String, color: Option<String>) -> Self {
        Self { id, name, color }
    }

    /// Key used to detect duplicate names
    pub fn name_key(&self) -> String {
        Self::normalize_name(&self.name)
    }

    /// Trimmed, lowercased (full Unicode) form of a tag name
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

impl Entity for Tag {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
