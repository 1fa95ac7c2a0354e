//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;

use crate::domain::{
    Comment, CommentTarget, ContainerRef, DomainResult, Entity, Positioned, Reaction, ReactionTarget, Tag, Task,
};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity, returning it with its assigned ID
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Storage for entities kept in per-container order
#[async_trait]
pub trait PositionedRepository<T: Positioned>: Repository<T> {
    /// Direct children of a container sorted by order, then id
    async fn children_of(&self, container: ContainerRef) -> DomainResult<Vec<T>>;

    /// Persist a new order for one entity
    async fn set_order(&self, id: u32, order: i32) -> DomainResult<()>;
}

/// Task-tag relationship operations
#[async_trait]
pub trait TaskTagOperations: Send + Sync {
    /// Attach a tag to a task
    async fn add_tag_to_task(&self, task_id: u32, tag_id: u32) -> DomainResult<()>;

    /// Detach a tag from a task
    async fn remove_tag_from_task(&self, task_id: u32, tag_id: u32) -> DomainResult<()>;

    /// All tags of a task, sorted by name
    async fn tags_for_task(&self, task_id: u32) -> DomainResult<Vec<Tag>>;

    /// All tasks carrying a tag
    async fn tasks_with_tag(&self, tag_id: u32) -> DomainResult<Vec<Task>>;
}

/// Threaded comments on projects and tasks
#[async_trait]
pub trait CommentOperations: Repository<Comment> {
    /// Top-level comments on a target, oldest first
    async fn comments_on(&self, target: CommentTarget) -> DomainResult<Vec<Comment>>;

    /// Direct replies to a comment, oldest first
    async fn replies_to(&self, comment_id: u32) -> DomainResult<Vec<Comment>>;
}

/// Emoji reactions on tasks and comments
#[async_trait]
pub trait ReactionOperations: Send + Sync {
    /// Record `user_id` under the target's `emoji` reaction, creating the
    /// reaction on first use. Reacting twice is a conflict.
    async fn add_reaction(&self, target: ReactionTarget, emoji: &str, user_id: u32) -> DomainResult<Reaction>;

    /// Withdraw `user_id` from the reaction. Returns the remaining reaction,
    /// or `None` once its last user is gone.
    async fn remove_reaction(
        &self,
        target: ReactionTarget,
        emoji: &str,
        user_id: u32,
    ) -> DomainResult<Option<Reaction>>;

    /// All reactions on a target, oldest first
    async fn reactions_on(&self, target: ReactionTarget) -> DomainResult<Vec<Reaction>>;
}

/// Unit-of-work boundary around a command
#[async_trait]
pub trait Transactional: Send + Sync {
    async fn begin(&self) -> DomainResult<()>;

    async fn commit(&self) -> DomainResult<()>;

    async fn rollback(&self) -> DomainResult<()>;
}
