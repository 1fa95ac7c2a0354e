//! Container Resolution
//!
//! Turns a container reference from a request into a loaded [`Container`].

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Container, ContainerKind, ContainerRef, DomainError, DomainResult, Project, Section, Task};
use crate::repository::Repository;

#[derive(Clone)]
pub struct ContainerResolver {
    projects: Arc<dyn Repository<Project>>,
    sections: Arc<dyn Repository<Section>>,
    tasks: Arc<dyn Repository<Task>>,
}

impl ContainerResolver {
    pub fn new(
        projects: Arc<dyn Repository<Project>>,
        sections: Arc<dyn Repository<Section>>,
        tasks: Arc<dyn Repository<Task>>,
    ) -> Self {
        Self {
            projects,
            sections,
            tasks,
        }
    }

    /// Load the container a reference points at
    pub async fn resolve(&self, reference: ContainerRef) -> DomainResult<Container> {
        let found = match reference {
            ContainerRef::Project(id) => self.projects.find_by_id(id).await?.map(Container::Project),
            ContainerRef::Section(id) => self.sections.find_by_id(id).await?.map(Container::Section),
            ContainerRef::Task(id) => self.tasks.find_by_id(id).await?.map(Container::Task),
        };
        found.ok_or_else(|| DomainError::not_found(reference.kind().as_str(), reference.id()))
    }

    /// Resolve a `("project" | "section" | "task", id)` pair
    pub async fn resolve_tagged(&self, tag: &str, id: u32) -> DomainResult<Container> {
        let kind = ContainerKind::parse(tag)?;
        self.resolve(ContainerRef::new(kind, id)).await
    }

    /// Resolve request fields of which exactly one must be set
    pub async fn resolve_parts(
        &self,
        project_id: Option<u32>,
        section_id: Option<u32>,
        parent_task_id: Option<u32>,
    ) -> DomainResult<Container> {
        let reference = ContainerRef::from_parts(project_id, section_id, parent_task_id)?;
        self.resolve(reference).await
    }

    /// Reject placing `task_id` under itself or one of its subtasks
    pub async fn ensure_not_descendant(&self, task_id: u32, destination: ContainerRef) -> DomainResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = destination;

        while let ContainerRef::Task(parent_id) = cursor {
            if parent_id == task_id {
                return Err(DomainError::InvalidContainer(format!(
                    "task {} cannot be placed under itself or its subtasks",
                    task_id
                )));
            }
            if !seen.insert(parent_id) {
                return Err(DomainError::Internal(format!("task {} is part of a parent cycle", parent_id)));
            }
            cursor = self
                .tasks
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| DomainError::not_found("task", parent_id))?
                .container;
        }
        Ok(())
    }
}
