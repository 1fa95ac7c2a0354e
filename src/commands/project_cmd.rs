//! Commands for Projects

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use super::task_cmd::{purge_container, require_name};
use crate::domain::{ContainerRef, DomainError, DomainResult, Project};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdateParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub clear_deadline: bool,
    pub accent_color: Option<String>,
    pub icon: Option<String>,
    pub is_favorite: Option<bool>,
    pub show_completed_tasks: Option<bool>,
}

pub async fn create_project(
    state: &AppState,
    name: String,
    description: Option<String>,
) -> DomainResult<Project> {
    let name = require_name(&name, "project")?;

    state
        .transaction(async {
            let mut project = Project::new(0, name);
            project.description = description;
            state.projects.create(&project).await
        })
        .await
}

pub async fn get_project(state: &AppState, id: u32) -> DomainResult<Project> {
    state
        .projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("project", id))
}

pub async fn list_projects(state: &AppState) -> DomainResult<Vec<Project>> {
    state.projects.list().await
}

/// Edit a project's fields. Unset fields keep their value.
pub async fn update_project(state: &AppState, id: u32, params: ProjectUpdateParams) -> DomainResult<Project> {
    let name = params.name.as_deref().map(|n| require_name(n, "project")).transpose()?;

    state
        .transaction(async {
            let existing = get_project(state, id).await?;
            let deadline = if params.clear_deadline {
                None
            } else {
                params.deadline.or(existing.deadline)
            };
            let updated = Project {
                name: name.unwrap_or(existing.name),
                description: params.description.or(existing.description),
                deadline,
                accent_color: params.accent_color.or(existing.accent_color),
                icon: params.icon.or(existing.icon),
                is_favorite: params.is_favorite.unwrap_or(existing.is_favorite),
                show_completed_tasks: params.show_completed_tasks.unwrap_or(existing.show_completed_tasks),
                ..existing
            };
            state.projects.update(&updated).await
        })
        .await
}

/// Delete a project together with its sections and every task inside it
pub async fn delete_project(state: &AppState, id: u32) -> DomainResult<()> {
    state
        .transaction(async {
            let project = get_project(state, id).await?;
            let container = ContainerRef::Project(project.id);

            let mut removed = 0;
            for section in state.sections.children(container).await? {
                removed += purge_container(state, ContainerRef::Section(section.id)).await?;
                state.section_store.delete(section.id).await?;
            }
            removed += purge_container(state, container).await?;
            state.projects.delete(project.id).await?;

            info!("deleted project {} with {} tasks", project.id, removed);
            Ok(())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create_section, create_task, get_task, list_sections, TaskCreateParams};
    use crate::config::BoardConfig;

    #[tokio::test]
    async fn test_project_crud() {
        let state = AppState::in_memory(BoardConfig::default());

        let project = create_project(&state, "  Home ".into(), None).await.unwrap();
        assert_eq!(project.name, "Home");

        let params = ProjectUpdateParams {
            description: Some("Chores".into()),
            is_favorite: Some(true),
            ..Default::default()
        };
        let updated = update_project(&state, project.id, params).await.unwrap();
        assert_eq!(updated.name, "Home");
        assert!(updated.is_favorite);
        assert_eq!(list_projects(&state).await.unwrap().len(), 1);

        let blank = ProjectUpdateParams {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_project(&state, project.id, blank).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(get_project(&state, 77).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_project_display_settings_persist() {
        let states = [
            AppState::in_memory(BoardConfig::default()),
            AppState::open(BoardConfig::sqlite(crate::repository::IN_MEMORY))
                .await
                .unwrap(),
        ];

        for state in states {
            let project = create_project(&state, "Garden".into(), None).await.unwrap();
            assert!(!project.show_completed_tasks);

            let params = ProjectUpdateParams {
                deadline: NaiveDate::from_ymd_opt(2026, 5, 1),
                accent_color: Some("#33AA55".into()),
                icon: Some("leaf".into()),
                show_completed_tasks: Some(true),
                ..Default::default()
            };
            update_project(&state, project.id, params).await.unwrap();

            let stored = get_project(&state, project.id).await.unwrap();
            assert_eq!(stored.deadline, NaiveDate::from_ymd_opt(2026, 5, 1));
            assert_eq!(stored.accent_color.as_deref(), Some("#33AA55"));
            assert_eq!(stored.icon.as_deref(), Some("leaf"));
            assert!(stored.show_completed_tasks);

            let clear = ProjectUpdateParams {
                clear_deadline: true,
                ..Default::default()
            };
            let cleared = update_project(&state, project.id, clear).await.unwrap();
            assert_eq!(cleared.deadline, None);
            assert_eq!(get_project(&state, project.id).await.unwrap().icon.as_deref(), Some("leaf"));
        }
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let state = AppState::open(BoardConfig::sqlite(crate::repository::IN_MEMORY))
            .await
            .unwrap();
        let project = create_project(&state, "Home".into(), None).await.unwrap();
        let section = create_section(&state, project.id, "Now".into(), None).await.unwrap();
        let in_section = create_task(
            &state,
            TaskCreateParams {
                name: "Sweep".into(),
                section_id: Some(section.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let nested = create_task(
            &state,
            TaskCreateParams {
                name: "Corners".into(),
                parent_task_id: Some(in_section.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_project(&state, project.id).await.unwrap();
        assert!(get_project(&state, project.id).await.is_err());
        assert!(get_task(&state, nested.id).await.is_err());
        assert!(list_sections(&state, project.id).await.is_err());
    }
}
