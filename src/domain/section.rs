//! Section Entity
//!
//! A named group of tasks inside a project. Sections are ordered among the
//! other sections of the same project.

use serde::{Deserialize, Serialize};

use super::container::{ContainerKind, ContainerRef};
use super::entity::{Entity, Positioned};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier
    pub id: u32,
    pub name: String,
    /// Owning project (a section always lives in a project)
    pub project_id: u32,
    /// Position among the project's sections
    pub order: i32,
    /// Whether the section's tasks are hidden in the UI
    pub is_collapsed: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Section {
    pub fn new(id: u32, name: String, project_id: u32) -> Self {
        Self {
            id,
            name,
            project_id,
            order: 0,
            is_collapsed: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Section {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Positioned for Section {
    const NAME: &'static str = "section";

    fn accepts(kind: ContainerKind) -> bool {
        kind == ContainerKind::Project
    }

    fn container(&self) -> ContainerRef {
        ContainerRef::Project(self.project_id)
    }

    fn set_container(&mut self, container: ContainerRef) {
        if let ContainerRef::Project(id) = container {
            self.project_id = id;
        }
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_section_lives_in_project() {
        let mut section = Section::new(1, "Backlog".to_string(), 3);
        assert_eq!(section.container(), ContainerRef::Project(3));

        section.place_in(ContainerRef::Project(5)).unwrap();
        assert_eq!(section.project_id, 5);
    }

    #[test]
    fn test_section_rejects_non_project_container() {
        let mut section = Section::new(1, "Backlog".to_string(), 3);
        let err = section.place_in(ContainerRef::Section(2)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidContainer(_)));
        assert_eq!(section.project_id, 3);
    }
}
