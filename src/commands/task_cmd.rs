//! Commands for Tasks
//!
//! Creation, edits, completion, moves and cascading deletes. Order changes
//! always go through the task [`OrderManager`](crate::ordering::OrderManager).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::state::AppState;
use crate::domain::{ContainerKind, ContainerRef, DomainError, DomainResult, Task};

/// Fields for a new task. Exactly one of the container ids must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCreateParams {
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<u32>,
    pub section_id: Option<u32>,
    pub parent_task_id: Option<u32>,
    /// Exact position; the configured insert policy applies without one
    pub order: Option<i32>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdateParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub clear_deadline: bool,
}

/// A container named by its type tag ("project", "section" or "task")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerTag {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u32,
}

impl ContainerTag {
    pub fn new(kind: &str, id: u32) -> Self {
        Self {
            kind: kind.to_string(),
            id,
        }
    }

    pub fn to_ref(&self) -> DomainResult<ContainerRef> {
        Ok(ContainerRef::new(ContainerKind::parse(&self.kind)?, self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMove {
    /// Where the caller believes the task is; rejected if it is elsewhere
    pub source: Option<ContainerTag>,
    pub destination: ContainerTag,
    pub order: i32,
}

pub(crate) fn require_name(name: &str, entity: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} name must not be empty", entity)));
    }
    Ok(name.to_string())
}

/// Every task nested under `task_id`, parents before their subtasks
pub(crate) async fn collect_descendants(state: &AppState, task_id: u32) -> DomainResult<Vec<Task>> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([task_id]);

    while let Some(parent_id) = queue.pop_front() {
        for child in state.tasks.children(ContainerRef::Task(parent_id)).await? {
            queue.push_back(child.id);
            found.push(child);
        }
    }
    Ok(found)
}

/// Delete the subtasks of `task_id`, deepest first. Their containers go
/// away with them, so nothing is renumbered.
pub(crate) async fn purge_descendants(state: &AppState, task_id: u32) -> DomainResult<usize> {
    let descendants = collect_descendants(state, task_id).await?;
    for task in descendants.iter().rev() {
        state.task_store.delete(task.id).await?;
    }
    Ok(descendants.len())
}

/// Delete every task in a container that is itself being deleted
pub(crate) async fn purge_container(state: &AppState, container: ContainerRef) -> DomainResult<usize> {
    let mut removed = 0;
    for task in state.tasks.children(container).await? {
        removed += purge_descendants(state, task.id).await?;
        state.task_store.delete(task.id).await?;
        removed += 1;
    }
    Ok(removed)
}

pub async fn create_task(state: &AppState, params: TaskCreateParams) -> DomainResult<Task> {
    let name = require_name(&params.name, "task")?;

    state
        .transaction(async {
            let container = state
                .resolver
                .resolve_parts(params.project_id, params.section_id, params.parent_task_id)
                .await?;

            let mut task = Task::new(0, name, container.reference());
            task.description = params.description.clone();
            task.deadline = params.deadline;
            state.tasks.create(&container, &task, params.order).await
        })
        .await
}

pub async fn get_task(state: &AppState, id: u32) -> DomainResult<Task> {
    state.tasks.get(id).await
}

/// Ordered direct children of a container given by type tag
pub async fn get_children(state: &AppState, container_type: &str, id: u32) -> DomainResult<Vec<Task>> {
    let container = state.resolver.resolve_tagged(container_type, id).await?;
    state.tasks.children(container.reference()).await
}

pub async fn get_descendants(state: &AppState, id: u32) -> DomainResult<Vec<Task>> {
    state.tasks.get(id).await?;
    collect_descendants(state, id).await
}

/// Edit a task's fields. Order and placement only change through `move_task`.
pub async fn update_task(state: &AppState, id: u32, params: TaskUpdateParams) -> DomainResult<Task> {
    let name = params.name.as_deref().map(|n| require_name(n, "task")).transpose()?;

    state
        .transaction(async {
            let mut task = state.tasks.get(id).await?;
            if let Some(name) = name {
                task.name = name;
            }
            if let Some(description) = params.description.clone() {
                task.description = Some(description);
            }
            if params.clear_deadline {
                task.deadline = None;
            } else if params.deadline.is_some() {
                task.deadline = params.deadline;
            }
            state.task_store.update(&task).await
        })
        .await
}

/// Flip completion, stamping or clearing `done_at`
pub async fn toggle_task(state: &AppState, id: u32) -> DomainResult<Task> {
    state
        .transaction(async {
            let mut task = state.tasks.get(id).await?;
            let done = !task.is_done;
            task.set_done(done, chrono::Utc::now().timestamp_millis());
            state.task_store.update(&task).await
        })
        .await
}

/// Delete a task with all its subtasks and close the gap among its siblings
pub async fn delete_task(state: &AppState, id: u32) -> DomainResult<()> {
    state
        .transaction(async {
            let task = state.tasks.get(id).await?;
            purge_descendants(state, id).await?;
            state.tasks.delete(&task).await
        })
        .await
}

pub async fn move_task(state: &AppState, id: u32, request: TaskMove) -> DomainResult<Task> {
    state
        .transaction(async {
            let task = state.tasks.get(id).await?;
            if let Some(source) = &request.source {
                let source = source.to_ref()?;
                if source != task.container {
                    return Err(DomainError::InvalidContainer(format!(
                        "task {} is in {}, not {}",
                        id, task.container, source
                    )));
                }
            }

            let destination = state.resolver.resolve(request.destination.to_ref()?).await?;
            state
                .resolver
                .ensure_not_descendant(id, destination.reference())
                .await?;
            state.tasks.reorder(&task, &destination, request.order).await
        })
        .await
}
