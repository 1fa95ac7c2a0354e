//! Project Entity
//!
//! Top-level container. Holds sections and root tasks, each kept in its own
//! dense order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub is_favorite: bool,
    pub deadline: Option<NaiveDate>,
    /// Color (hex, e.g., "#3366FF")
    pub accent_color: Option<String>,
    pub icon: Option<String>,
    /// Whether finished tasks stay visible in the project view
    pub show_completed_tasks: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Project {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            is_favorite: false,
            deadline: None,
            accent_color: None,
            icon: None,
            show_completed_tasks: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Project {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
