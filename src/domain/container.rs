//! Containers
//!
//! Tasks and sections live inside a container: a project, a section, or (for
//! tasks only) a parent task. [`ContainerRef`] names a container by kind and
//! id; [`Container`] is a loaded instance whose variant decides which
//! placement a moved item receives.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{DomainError, DomainResult};
use super::project::Project;
use super::section::Section;
use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Project,
    Section,
    Task,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Project => "project",
            ContainerKind::Section => "section",
            ContainerKind::Task => "task",
        }
    }

    /// Parse a request tag. Unknown tags never fall back to a default kind.
    pub fn parse(tag: &str) -> DomainResult<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(ContainerKind::Project),
            "section" => Ok(ContainerKind::Section),
            "task" => Ok(ContainerKind::Task),
            other => Err(DomainError::InvalidContainer(format!(
                "unknown container type '{}'",
                other
            ))),
        }
    }
}

/// Reference to a container by kind and id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ContainerRef {
    Project(u32),
    Section(u32),
    Task(u32),
}

impl ContainerRef {
    pub fn new(kind: ContainerKind, id: u32) -> Self {
        match kind {
            ContainerKind::Project => ContainerRef::Project(id),
            ContainerKind::Section => ContainerRef::Section(id),
            ContainerKind::Task => ContainerRef::Task(id),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerRef::Project(_) => ContainerKind::Project,
            ContainerRef::Section(_) => ContainerKind::Section,
            ContainerRef::Task(_) => ContainerKind::Task,
        }
    }

    pub fn id(&self) -> u32 {
        match *self {
            ContainerRef::Project(id) | ContainerRef::Section(id) | ContainerRef::Task(id) => id,
        }
    }

    /// Build a reference from request fields. Exactly one id must be given.
    pub fn from_parts(
        project_id: Option<u32>,
        section_id: Option<u32>,
        parent_task_id: Option<u32>,
    ) -> DomainResult<Self> {
        match (project_id, section_id, parent_task_id) {
            (Some(id), None, None) => Ok(ContainerRef::Project(id)),
            (None, Some(id), None) => Ok(ContainerRef::Section(id)),
            (None, None, Some(id)) => Ok(ContainerRef::Task(id)),
            (None, None, None) => Err(DomainError::InvalidContainer(
                "one of project_id, section_id or parent_task_id is required".into(),
            )),
            _ => Err(DomainError::InvalidContainer(
                "only one of project_id, section_id or parent_task_id may be given".into(),
            )),
        }
    }

    /// Read a stored placement. Project wins over section, section over parent task.
    pub fn from_columns(
        project_id: Option<u32>,
        section_id: Option<u32>,
        parent_task_id: Option<u32>,
    ) -> DomainResult<Self> {
        project_id
            .map(ContainerRef::Project)
            .or(section_id.map(ContainerRef::Section))
            .or(parent_task_id.map(ContainerRef::Task))
            .ok_or_else(|| DomainError::InvalidContainer("stored row has no container".into()))
    }

    pub fn project_id(&self) -> Option<u32> {
        match *self {
            ContainerRef::Project(id) => Some(id),
            _ => None,
        }
    }

    pub fn section_id(&self) -> Option<u32> {
        match *self {
            ContainerRef::Section(id) => Some(id),
            _ => None,
        }
    }

    pub fn parent_task_id(&self) -> Option<u32> {
        match *self {
            ContainerRef::Task(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().as_str(), self.id())
    }
}

/// A loaded container instance
#[derive(Debug, Clone)]
pub enum Container {
    Project(Project),
    Section(Section),
    Task(Task),
}

impl Container {
    /// The reference an item placed in this container stores
    pub fn reference(&self) -> ContainerRef {
        match self {
            Container::Project(project) => ContainerRef::Project(project.id),
            Container::Section(section) => ContainerRef::Section(section.id),
            Container::Task(task) => ContainerRef::Task(task.id),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.reference().kind()
    }
}
