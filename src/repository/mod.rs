//! Repository Layer
//!
//! Data access abstractions and implementations: SQLite for persistent
//! boards and an in-memory store for tests and throwaway sessions.

mod traits;
mod db;
mod memory;
mod comment_repo;
mod project_repo;
mod reaction_repo;
mod section_repo;
mod task_repo;
mod tag;

#[cfg(test)]
mod tests;

pub use traits::{
    CommentOperations, PositionedRepository, ReactionOperations, Repository, TaskTagOperations, Transactional,
};
pub use db::{init_db, DbState, SharedConnection, IN_MEMORY};
pub use memory::MemoryStore;
pub use comment_repo::CommentRepository;
pub use project_repo::ProjectRepository;
pub use reaction_repo::ReactionRepository;
pub use section_repo::SectionRepository;
pub use task_repo::TaskRepository;
pub use tag::TagRepository;
