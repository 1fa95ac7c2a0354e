//! Commands for Tags
//!
//! Tag CRUD and task-tag relationships.

use super::state::AppState;
use super::task_cmd::require_name;
use crate::domain::{DomainResult, Tag, Task};

pub async fn create_tag(state: &AppState, name: String, color: Option<String>) -> DomainResult<Tag> {
    let name = require_name(&name, "tag")?;
    state
        .transaction(async { state.tags.create(&Tag::new(0, name, color)).await })
        .await
}

/// List all tags, sorted by name
pub async fn list_tags(state: &AppState) -> DomainResult<Vec<Tag>> {
    state.tags.list().await
}

pub async fn delete_tag(state: &AppState, id: u32) -> DomainResult<()> {
    state.transaction(async { state.tags.delete(id).await }).await
}

// ========================
// Task-Tag Relationships
// ========================

pub async fn add_task_tag(state: &AppState, task_id: u32, tag_id: u32) -> DomainResult<()> {
    state
        .transaction(async { state.task_tags.add_tag_to_task(task_id, tag_id).await })
        .await
}

pub async fn remove_task_tag(state: &AppState, task_id: u32, tag_id: u32) -> DomainResult<()> {
    state
        .transaction(async { state.task_tags.remove_tag_from_task(task_id, tag_id).await })
        .await
}

pub async fn get_task_tags(state: &AppState, task_id: u32) -> DomainResult<Vec<Tag>> {
    state.task_tags.tags_for_task(task_id).await
}

pub async fn get_tasks_by_tag(state: &AppState, tag_id: u32) -> DomainResult<Vec<Task>> {
    state.task_tags.tasks_with_tag(tag_id).await
}
