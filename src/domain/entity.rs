//! Domain Layer - Core Entity Traits
//!
//! Every stored entity has a unique ID and is thread-safe. Entities that live
//! at a position inside a container (tasks and sections) also implement
//! [`Positioned`].

use serde::{Deserialize, Serialize};

use super::container::{ContainerKind, ContainerRef};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone + 'static {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Display + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// An entity kept in a dense, zero-based order among its siblings.
pub trait Positioned: Entity<Id = u32> {
    /// Lowercase entity name used in messages ("task", "section")
    const NAME: &'static str;

    /// Whether this entity may live in a container of the given kind
    fn accepts(kind: ContainerKind) -> bool;

    /// The container this entity currently belongs to
    fn container(&self) -> ContainerRef;

    /// Point the entity at a container already checked by [`Positioned::accepts`]
    fn set_container(&mut self, container: ContainerRef);

    fn order(&self) -> i32;

    fn set_order(&mut self, order: i32);

    /// Move the entity into `container`, rejecting container kinds it cannot live in
    fn place_in(&mut self, container: ContainerRef) -> DomainResult<()> {
        if !Self::accepts(container.kind()) {
            return Err(DomainError::InvalidContainer(format!(
                "a {} cannot be placed in a {}",
                Self::NAME,
                container.kind().as_str()
            )));
        }
        self.set_container(container);
        Ok(())
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid container: {0}")]
    InvalidContainer(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound(format!("{} {}", entity, id))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("serialization: {}", e))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Internal(format!("io: {}", e))
    }
}
