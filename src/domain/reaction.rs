//! Reaction Entity
//!
//! An emoji on a task or a comment, shared by every user who reacted with
//! it. There is at most one reaction per target and emoji; it disappears
//! once its last user withdraws.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{DomainError, DomainResult, Entity};

/// What a reaction is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ReactionTarget {
    Task(u32),
    Comment(u32),
}

impl ReactionTarget {
    pub fn from_columns(task_id: Option<u32>, comment_id: Option<u32>) -> DomainResult<Self> {
        match (task_id, comment_id) {
            (Some(id), None) => Ok(ReactionTarget::Task(id)),
            (None, Some(id)) => Ok(ReactionTarget::Comment(id)),
            _ => Err(DomainError::Internal(
                "stored reaction must have exactly one target".into(),
            )),
        }
    }

    pub fn id(&self) -> u32 {
        match *self {
            ReactionTarget::Task(id) | ReactionTarget::Comment(id) => id,
        }
    }

    pub fn task_id(&self) -> Option<u32> {
        match *self {
            ReactionTarget::Task(id) => Some(id),
            ReactionTarget::Comment(_) => None,
        }
    }

    pub fn comment_id(&self) -> Option<u32> {
        match *self {
            ReactionTarget::Comment(id) => Some(id),
            ReactionTarget::Task(_) => None,
        }
    }
}

impl fmt::Display for ReactionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionTarget::Task(id) => write!(f, "task {}", id),
            ReactionTarget::Comment(id) => write!(f, "comment {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Unique identifier
    pub id: u32,
    pub emoji: String,
    pub target: ReactionTarget,
    /// Users who reacted, ascending
    pub user_ids: Vec<u32>,
    pub created_at: Option<i64>,
}

impl Reaction {
    pub fn new(id: u32, emoji: String, target: ReactionTarget) -> Self {
        Self {
            id,
            emoji,
            target,
            user_ids: Vec::new(),
            created_at: None,
        }
    }

    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    /// Trim an emoji and reject empty or whitespace-containing input
    pub fn normalize_emoji(emoji: &str) -> DomainResult<String> {
        let emoji = emoji.trim();
        if emoji.is_empty() || emoji.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidInput(format!("'{}' is not an emoji", emoji)));
        }
        Ok(emoji.to_string())
    }
}

impl Entity for Reaction {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
