//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO storage dependencies.

mod comment;
mod container;
mod entity;
mod project;
mod reaction;
mod section;
mod tag;
mod task;

pub use comment::{Comment, CommentTarget};
pub use container::{Container, ContainerKind, ContainerRef};
pub use entity::{DomainError, DomainResult, Entity, Positioned};
pub use project::Project;
pub use reaction::{Reaction, ReactionTarget};
pub use section::Section;
pub use tag::Tag;
pub use task::Task;
