//! In-Memory Store
//!
//! Every table lives in an ordered map behind one mutex. `begin` snapshots
//! the tables and `rollback` restores the snapshot, so a failed command
//! leaves no trace. Writes can be made to fail on purpose to exercise that
//! path.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::db::now_millis;
use super::traits::{
    CommentOperations, PositionedRepository, ReactionOperations, Repository, TaskTagOperations, Transactional,
};
use crate::domain::{
    Comment, CommentTarget, ContainerRef, DomainError, DomainResult, Project, Reaction, ReactionTarget, Section, Tag,
    Task,
};

/// Last id handed out per table
#[derive(Debug, Clone, Default)]
struct Sequences {
    project: u32,
    section: u32,
    task: u32,
    tag: u32,
    comment: u32,
    reaction: u32,
}

fn next_id(sequence: &mut u32) -> u32 {
    *sequence += 1;
    *sequence
}

#[derive(Debug, Clone, Default)]
struct Tables {
    projects: BTreeMap<u32, Project>,
    sections: BTreeMap<u32, Section>,
    tasks: BTreeMap<u32, Task>,
    tags: BTreeMap<u32, Tag>,
    /// (task_id, tag_id)
    task_tags: BTreeSet<(u32, u32)>,
    comments: BTreeMap<u32, Comment>,
    reactions: BTreeMap<u32, Reaction>,
    sequences: Sequences,
}

impl Tables {
    fn tag_name_taken(&self, tag: &Tag) -> bool {
        let key = tag.name_key();
        self.tags.values().any(|t| t.id != tag.id && t.name_key() == key)
    }

    fn comment_target_exists(&self, target: CommentTarget) -> DomainResult<()> {
        match target {
            CommentTarget::Project(id) if !self.projects.contains_key(&id) => {
                Err(DomainError::not_found("project", id))
            }
            CommentTarget::Task(id) if !self.tasks.contains_key(&id) => Err(DomainError::not_found("task", id)),
            _ => Ok(()),
        }
    }

    fn reaction_target_exists(&self, target: ReactionTarget) -> DomainResult<()> {
        match target {
            ReactionTarget::Task(id) if !self.tasks.contains_key(&id) => Err(DomainError::not_found("task", id)),
            ReactionTarget::Comment(id) if !self.comments.contains_key(&id) => {
                Err(DomainError::not_found("comment", id))
            }
            _ => Ok(()),
        }
    }

    fn find_reaction(&self, target: ReactionTarget, emoji: &str) -> Option<u32> {
        self.reactions
            .values()
            .find(|r| r.target == target && r.emoji == emoji)
            .map(|r| r.id)
    }

    /// Remove comments with their replies and the reactions on them
    fn drop_comments(&mut self, mut pending: Vec<u32>) {
        while let Some(id) = pending.pop() {
            if self.comments.remove(&id).is_none() {
                continue;
            }
            pending.extend(
                self.comments
                    .values()
                    .filter(|c| c.parent_comment_id == Some(id))
                    .map(|c| c.id),
            );
            self.reactions.retain(|_, r| r.target != ReactionTarget::Comment(id));
        }
    }

    fn drop_comments_on(&mut self, target: CommentTarget) {
        let attached = self
            .comments
            .values()
            .filter(|c| c.target == target)
            .map(|c| c.id)
            .collect();
        self.drop_comments(attached);
    }

    fn sorted_comments<F: Fn(&Comment) -> bool>(&self, keep: F) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self.comments.values().filter(|c| keep(*c)).cloned().collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        comments
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: Tables,
    snapshot: Option<Tables>,
    /// Remaining writes before injected failures start
    writes_left: Option<usize>,
}

impl MemoryState {
    /// Tables for a write, honouring injected failures
    fn write(&mut self) -> DomainResult<&mut Tables> {
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(DomainError::Internal("injected write failure".to_string()));
            }
            *left -= 1;
        }
        Ok(&mut self.tables)
    }
}

/// Shared in-memory implementation of every storage trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the next `writes` writes succeed and fail every write after them
    pub async fn fail_writes_after(&self, writes: usize) {
        self.state.lock().await.writes_left = Some(writes);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.writes_left = None;
    }
}

#[async_trait]
impl Transactional for MemoryStore {
    async fn begin(&self) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if state.snapshot.is_some() {
            return Err(DomainError::Internal("transaction already active".to_string()));
        }
        state.snapshot = Some(state.tables.clone());
        Ok(())
    }

    async fn commit(&self) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        state
            .snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| DomainError::Internal("no transaction is active".to_string()))
    }

    async fn rollback(&self) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let snapshot = state
            .snapshot
            .take()
            .ok_or_else(|| DomainError::Internal("no transaction is active".to_string()))?;
        state.tables = snapshot;
        Ok(())
    }
}

// ========================================================================
// Projects
// ========================================================================

#[async_trait]
impl Repository<Project> for MemoryStore {
    async fn create(&self, entity: &Project) -> DomainResult<Project> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let now = now_millis();
        let mut project = entity.clone();
        project.id = next_id(&mut tables.sequences.project);
        project.created_at = Some(now);
        project.updated_at = Some(now);
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Project>> {
        Ok(self.state.lock().await.tables.projects.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Project>> {
        Ok(self.state.lock().await.tables.projects.values().cloned().collect())
    }

    async fn update(&self, entity: &Project) -> DomainResult<Project> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let stored = tables
            .projects
            .get_mut(&entity.id)
            .ok_or_else(|| DomainError::not_found("project", entity.id))?;
        *stored = entity.clone();
        stored.updated_at = Some(now_millis());
        Ok(stored.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        tables
            .projects
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("project", id))?;
        tables.drop_comments_on(CommentTarget::Project(id));
        Ok(())
    }
}

// ========================================================================
// Sections
// ========================================================================

#[async_trait]
impl Repository<Section> for MemoryStore {
    async fn create(&self, entity: &Section) -> DomainResult<Section> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let now = now_millis();
        let mut section = entity.clone();
        section.id = next_id(&mut tables.sequences.section);
        section.created_at = Some(now);
        section.updated_at = Some(now);
        tables.sections.insert(section.id, section.clone());
        Ok(section)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Section>> {
        Ok(self.state.lock().await.tables.sections.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Section>> {
        let state = self.state.lock().await;
        let mut sections: Vec<Section> = state.tables.sections.values().cloned().collect();
        sections.sort_by_key(|s| (s.project_id, s.order, s.id));
        Ok(sections)
    }

    async fn update(&self, entity: &Section) -> DomainResult<Section> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let stored = tables
            .sections
            .get_mut(&entity.id)
            .ok_or_else(|| DomainError::not_found("section", entity.id))?;
        *stored = entity.clone();
        stored.updated_at = Some(now_millis());
        Ok(stored.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        tables
            .sections
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("section", id))
    }
}

#[async_trait]
impl PositionedRepository<Section> for MemoryStore {
    async fn children_of(&self, container: ContainerRef) -> DomainResult<Vec<Section>> {
        let state = self.state.lock().await;
        let mut sections: Vec<Section> = state
            .tables
            .sections
            .values()
            .filter(|s| ContainerRef::Project(s.project_id) == container)
            .cloned()
            .collect();
        sections.sort_by_key(|s| (s.order, s.id));
        Ok(sections)
    }

    async fn set_order(&self, id: u32, order: i32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let section = tables
            .sections
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("section", id))?;
        section.order = order;
        section.updated_at = Some(now_millis());
        Ok(())
    }
}

// ========================================================================
// Tasks
// ========================================================================

#[async_trait]
impl Repository<Task> for MemoryStore {
    async fn create(&self, entity: &Task) -> DomainResult<Task> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let now = now_millis();
        let mut task = entity.clone();
        task.id = next_id(&mut tables.sequences.task);
        task.created_at = Some(now);
        task.updated_at = Some(now);
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Task>> {
        Ok(self.state.lock().await.tables.tasks.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Task>> {
        Ok(self.state.lock().await.tables.tasks.values().cloned().collect())
    }

    async fn update(&self, entity: &Task) -> DomainResult<Task> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let stored = tables
            .tasks
            .get_mut(&entity.id)
            .ok_or_else(|| DomainError::not_found("task", entity.id))?;
        *stored = entity.clone();
        stored.updated_at = Some(now_millis());
        Ok(stored.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        tables
            .tasks
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("task", id))?;
        tables.task_tags.retain(|(task_id, _)| *task_id != id);
        tables.reactions.retain(|_, r| r.target != ReactionTarget::Task(id));
        tables.drop_comments_on(CommentTarget::Task(id));
        Ok(())
    }
}

#[async_trait]
impl PositionedRepository<Task> for MemoryStore {
    async fn children_of(&self, container: ContainerRef) -> DomainResult<Vec<Task>> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tables
            .tasks
            .values()
            .filter(|t| t.container == container)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.order, t.id));
        Ok(tasks)
    }

    async fn set_order(&self, id: u32, order: i32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let task = tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("task", id))?;
        task.order = order;
        task.updated_at = Some(now_millis());
        Ok(())
    }
}

// ========================================================================
// Tags
// ========================================================================

#[async_trait]
impl Repository<Tag> for MemoryStore {
    async fn create(&self, entity: &Tag) -> DomainResult<Tag> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        if tables.tag_name_taken(entity) {
            return Err(DomainError::Conflict(format!("tag '{}' already exists", entity.name.trim())));
        }
        let mut tag = entity.clone();
        tag.id = next_id(&mut tables.sequences.tag);
        tag.name = entity.name.trim().to_string();
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Tag>> {
        Ok(self.state.lock().await.tables.tags.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Tag>> {
        let state = self.state.lock().await;
        let mut tags: Vec<Tag> = state.tables.tags.values().cloned().collect();
        tags.sort_by_key(|t| t.name.to_lowercase());
        Ok(tags)
    }

    async fn update(&self, entity: &Tag) -> DomainResult<Tag> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        if !tables.tags.contains_key(&entity.id) {
            return Err(DomainError::not_found("tag", entity.id));
        }
        if tables.tag_name_taken(entity) {
            return Err(DomainError::Conflict(format!("tag '{}' already exists", entity.name.trim())));
        }
        let mut tag = entity.clone();
        tag.name = entity.name.trim().to_string();
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        tables
            .tags
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("tag", id))?;
        tables.task_tags.retain(|(_, tag_id)| *tag_id != id);
        Ok(())
    }
}

#[async_trait]
impl TaskTagOperations for MemoryStore {
    async fn add_tag_to_task(&self, task_id: u32, tag_id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        if !tables.tasks.contains_key(&task_id) {
            return Err(DomainError::not_found("task", task_id));
        }
        if !tables.tags.contains_key(&tag_id) {
            return Err(DomainError::not_found("tag", tag_id));
        }
        if !tables.task_tags.insert((task_id, tag_id)) {
            return Err(DomainError::Conflict(format!(
                "task {} already has tag {}",
                task_id, tag_id
            )));
        }
        Ok(())
    }

    async fn remove_tag_from_task(&self, task_id: u32, tag_id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        if !tables.task_tags.remove(&(task_id, tag_id)) {
            return Err(DomainError::NotFound(format!(
                "task {} has no tag {}",
                task_id, tag_id
            )));
        }
        Ok(())
    }

    async fn tags_for_task(&self, task_id: u32) -> DomainResult<Vec<Tag>> {
        let state = self.state.lock().await;
        let tables = &state.tables;

        if !tables.tasks.contains_key(&task_id) {
            return Err(DomainError::not_found("task", task_id));
        }
        let mut tags: Vec<Tag> = tables
            .task_tags
            .iter()
            .filter(|(t, _)| *t == task_id)
            .filter_map(|(_, tag_id)| tables.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by_key(|t| t.name.to_lowercase());
        Ok(tags)
    }

    async fn tasks_with_tag(&self, tag_id: u32) -> DomainResult<Vec<Task>> {
        let state = self.state.lock().await;
        let tables = &state.tables;

        if !tables.tags.contains_key(&tag_id) {
            return Err(DomainError::not_found("tag", tag_id));
        }
        Ok(tables
            .task_tags
            .iter()
            .filter(|(_, t)| *t == tag_id)
            .filter_map(|(task_id, _)| tables.tasks.get(task_id).cloned())
            .collect())
    }
}

// ========================================================================
// Comments
// ========================================================================

#[async_trait]
impl Repository<Comment> for MemoryStore {
    async fn create(&self, entity: &Comment) -> DomainResult<Comment> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        tables.comment_target_exists(entity.target)?;
        if let Some(parent_id) = entity.parent_comment_id {
            if !tables.comments.contains_key(&parent_id) {
                return Err(DomainError::not_found("comment", parent_id));
            }
        }

        let now = now_millis();
        let mut comment = entity.clone();
        comment.id = next_id(&mut tables.sequences.comment);
        comment.created_at = Some(now);
        comment.updated_at = Some(now);
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Comment>> {
        Ok(self.state.lock().await.tables.comments.get(&id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Comment>> {
        Ok(self.state.lock().await.tables.comments.values().cloned().collect())
    }

    async fn update(&self, entity: &Comment) -> DomainResult<Comment> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let stored = tables
            .comments
            .get_mut(&entity.id)
            .ok_or_else(|| DomainError::not_found("comment", entity.id))?;
        stored.body = entity.body.clone();
        stored.reason = entity.reason.clone();
        stored.updated_at = Some(now_millis());
        Ok(stored.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        if !tables.comments.contains_key(&id) {
            return Err(DomainError::not_found("comment", id));
        }
        tables.drop_comments(vec![id]);
        Ok(())
    }
}

#[async_trait]
impl CommentOperations for MemoryStore {
    async fn comments_on(&self, target: CommentTarget) -> DomainResult<Vec<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .sorted_comments(|c| c.target == target && !c.is_reply()))
    }

    async fn replies_to(&self, comment_id: u32) -> DomainResult<Vec<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .sorted_comments(|c| c.parent_comment_id == Some(comment_id)))
    }
}

// ========================================================================
// Reactions
// ========================================================================

#[async_trait]
impl ReactionOperations for MemoryStore {
    async fn add_reaction(&self, target: ReactionTarget, emoji: &str, user_id: u32) -> DomainResult<Reaction> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        tables.reaction_target_exists(target)?;
        let id = match tables.find_reaction(target, emoji) {
            Some(id) => id,
            None => {
                let mut reaction = Reaction::new(next_id(&mut tables.sequences.reaction), emoji.to_string(), target);
                reaction.created_at = Some(now_millis());
                tables.reactions.insert(reaction.id, reaction.clone());
                reaction.id
            }
        };

        let reaction = tables
            .reactions
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("reaction", id))?;
        if let Err(slot) = reaction.user_ids.binary_search(&user_id) {
            reaction.user_ids.insert(slot, user_id);
            Ok(reaction.clone())
        } else {
            Err(DomainError::Conflict(format!(
                "user {} already reacted {} on {}",
                user_id, emoji, target
            )))
        }
    }

    async fn remove_reaction(
        &self,
        target: ReactionTarget,
        emoji: &str,
        user_id: u32,
    ) -> DomainResult<Option<Reaction>> {
        let mut state = self.state.lock().await;
        let tables = state.write()?;

        let missing = || DomainError::NotFound(format!("user {} has no {} reaction on {}", user_id, emoji, target));
        let id = tables.find_reaction(target, emoji).ok_or_else(missing)?;
        let reaction = tables.reactions.get_mut(&id).ok_or_else(missing)?;
        let slot = reaction.user_ids.binary_search(&user_id).map_err(|_| missing())?;

        reaction.user_ids.remove(slot);
        if reaction.user_ids.is_empty() {
            tables.reactions.remove(&id);
            return Ok(None);
        }
        Ok(Some(reaction.clone()))
    }

    async fn reactions_on(&self, target: ReactionTarget) -> DomainResult<Vec<Reaction>> {
        let state = self.state.lock().await;
        let mut reactions: Vec<Reaction> = state
            .tables
            .reactions
            .values()
            .filter(|r| r.target == target)
            .cloned()
            .collect();
        reactions.sort_by_key(|r| (r.created_at, r.id));
        Ok(reactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let store = MemoryStore::new();
        let project = Repository::<Project>::create(&store, &Project::new(0, "Home".into()))
            .await
            .unwrap();

        store.begin().await.unwrap();
        Repository::<Project>::delete(&store, project.id).await.unwrap();
        store.rollback().await.unwrap();

        let found = Repository::<Project>::find_by_id(&store, project.id).await.unwrap();
        assert_eq!(found.map(|p| p.name), Some("Home".to_string()));
    }

    #[tokio::test]
    async fn test_injected_failure_stops_writes() {
        let store = MemoryStore::new();
        store.fail_writes_after(1).await;

        let first = Repository::<Project>::create(&store, &Project::new(0, "One".into())).await;
        let second = Repository::<Project>::create(&store, &Project::new(0, "Two".into())).await;
        assert!(first.is_ok());
        assert!(matches!(second, Err(DomainError::Internal(_))));

        store.clear_failures().await;
        assert!(Repository::<Project>::create(&store, &Project::new(0, "Three".into())).await.is_ok());
    }

    #[tokio::test]
    async fn test_commit_without_begin_fails() {
        let store = MemoryStore::new();
        assert!(store.commit().await.is_err());
        assert!(store.rollback().await.is_err());
    }

    #[tokio::test]
    async fn test_task_delete_drops_its_thread() {
        let store = MemoryStore::new();
        let project = Repository::<Project>::create(&store, &Project::new(0, "Home".into())).await.unwrap();
        let task = Task::new(0, "Paint".into(), ContainerRef::Project(project.id));
        let task = Repository::<Task>::create(&store, &task).await.unwrap();

        let target = CommentTarget::Task(task.id);
        let root = Repository::<Comment>::create(&store, &Comment::new(0, target, Some("Which color?".into())))
            .await
            .unwrap();
        let reply = Comment::reply_to(0, &root, Some("Blue".into()));
        Repository::<Comment>::create(&store, &reply).await.unwrap();
        store.add_reaction(ReactionTarget::Comment(root.id), "👍", 1).await.unwrap();
        store.add_reaction(ReactionTarget::Task(task.id), "🎨", 1).await.unwrap();

        Repository::<Task>::delete(&store, task.id).await.unwrap();

        let state = store.state.lock().await;
        assert!(state.tables.comments.is_empty());
        assert!(state.tables.reactions.is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let store = MemoryStore::new();
        let first = Repository::<Project>::create(&store, &Project::new(0, "A".into())).await.unwrap();
        Repository::<Project>::delete(&store, first.id).await.unwrap();
        let second = Repository::<Project>::create(&store, &Project::new(0, "B".into())).await.unwrap();
        assert!(second.id > first.id);
    }
}
