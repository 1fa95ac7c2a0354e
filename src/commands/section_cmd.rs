//! Commands for Sections
//!
//! Sections are ordered among the sections of their project.

use super::state::AppState;
use super::task_cmd::{purge_container, require_name};
use crate::domain::{Container, ContainerRef, DomainResult, Section};

pub async fn create_section(
    state: &AppState,
    project_id: u32,
    name: String,
    order: Option<i32>,
) -> DomainResult<Section> {
    let name = require_name(&name, "section")?;

    state
        .transaction(async {
            let project = state.resolver.resolve(ContainerRef::Project(project_id)).await?;
            let section = Section::new(0, name, project_id);
            state.sections.create(&project, &section, order).await
        })
        .await
}

pub async fn get_section(state: &AppState, id: u32) -> DomainResult<Section> {
    state.sections.get(id).await
}

/// Sections of a project in order
pub async fn list_sections(state: &AppState, project_id: u32) -> DomainResult<Vec<Section>> {
    let project = state.resolver.resolve(ContainerRef::Project(project_id)).await?;
    state.sections.children(project.reference()).await
}

pub async fn update_section(
    state: &AppState,
    id: u32,
    name: Option<String>,
    is_collapsed: Option<bool>,
) -> DomainResult<Section> {
    let name = name.as_deref().map(|n| require_name(n, "section")).transpose()?;

    state
        .transaction(async {
            let mut section = state.sections.get(id).await?;
            if let Some(name) = name {
                section.name = name;
            }
            if let Some(collapsed) = is_collapsed {
                section.is_collapsed = collapsed;
            }
            state.section_store.update(&section).await
        })
        .await
}

/// Delete a section and its tasks, then close the gap among its siblings
pub async fn delete_section(state: &AppState, id: u32) -> DomainResult<()> {
    state
        .transaction(async {
            let section = state.sections.get(id).await?;
            purge_container(state, ContainerRef::Section(section.id)).await?;
            state.sections.delete(&section).await
        })
        .await
}

/// Move a section to `order` in `project_id`, or within its own project
pub async fn move_section(
    state: &AppState,
    id: u32,
    project_id: Option<u32>,
    order: i32,
) -> DomainResult<Section> {
    state
        .transaction(async {
            let section = state.sections.get(id).await?;
            let target = ContainerRef::Project(project_id.unwrap_or(section.project_id));
            let destination: Container = state.resolver.resolve(target).await?;
            state.sections.reorder(&section, &destination, order).await
        })
        .await
}
