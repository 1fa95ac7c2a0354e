//! Tag Repository Module
//!
//! - tag_repo: Core CRUD operations
//! - task_tag: Task-Tag relationship operations

mod tag_repo;
mod task_tag;

pub use tag_repo::TagRepository;
