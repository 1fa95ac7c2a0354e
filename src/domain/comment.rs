//! Comment Entity
//!
//! Comments hang off a project or a task. A reply points at its parent
//! comment and always shares the parent's target, so a thread never spans
//! two targets.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{DomainError, DomainResult, Entity};

/// What a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum CommentTarget {
    Project(u32),
    Task(u32),
}

impl CommentTarget {
    /// Parse a `("project" | "task", id)` pair
    pub fn parse(tag: &str, id: u32) -> DomainResult<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(CommentTarget::Project(id)),
            "task" => Ok(CommentTarget::Task(id)),
            other => Err(DomainError::InvalidInput(format!(
                "comments cannot be attached to '{}'",
                other
            ))),
        }
    }

    /// Read a stored target. Exactly one column is set.
    pub fn from_columns(project_id: Option<u32>, task_id: Option<u32>) -> DomainResult<Self> {
        match (project_id, task_id) {
            (Some(id), None) => Ok(CommentTarget::Project(id)),
            (None, Some(id)) => Ok(CommentTarget::Task(id)),
            _ => Err(DomainError::Internal(
                "stored comment must have exactly one target".into(),
            )),
        }
    }

    pub fn id(&self) -> u32 {
        match *self {
            CommentTarget::Project(id) | CommentTarget::Task(id) => id,
        }
    }

    pub fn project_id(&self) -> Option<u32> {
        match *self {
            CommentTarget::Project(id) => Some(id),
            CommentTarget::Task(_) => None,
        }
    }

    pub fn task_id(&self) -> Option<u32> {
        match *self {
            CommentTarget::Task(id) => Some(id),
            CommentTarget::Project(_) => None,
        }
    }
}

impl fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentTarget::Project(id) => write!(f, "project {}", id),
            CommentTarget::Task(id) => write!(f, "task {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: u32,
    pub body: Option<String>,
    /// Why the comment was left (e.g. a status change note)
    pub reason: Option<String>,
    /// Author, as an id issued by the caller's user system
    pub owner_id: Option<u32>,
    pub target: CommentTarget,
    /// Set for replies
    pub parent_comment_id: Option<u32>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Comment {
    pub fn new(id: u32, target: CommentTarget, body: Option<String>) -> Self {
        Self {
            id,
            body,
            reason: None,
            owner_id: None,
            target,
            parent_comment_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// A reply to `parent`, attached to the same target
    pub fn reply_to(id: u32, parent: &Comment, body: Option<String>) -> Self {
        Self {
            parent_comment_id: Some(parent.id),
            ..Self::new(id, parent.target, body)
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    /// Whether the comment says anything at all
    pub fn has_content(&self) -> bool {
        let filled = |text: &Option<String>| text.as_deref().is_some_and(|t| !t.trim().is_empty());
        filled(&self.body) || filled(&self.reason)
    }
}

impl Entity for Comment {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_inherits_target() {
        let parent = Comment::new(3, CommentTarget::Task(8), Some("Blocked on review".into()));
        let reply = Comment::reply_to(0, &parent, Some("Reviewed".into()));

        assert!(reply.is_reply());
        assert_eq!(reply.parent_comment_id, Some(3));
        assert_eq!(reply.target, CommentTarget::Task(8));
    }

    #[test]
    fn test_content_required() {
        let mut comment = Comment::new(1, CommentTarget::Project(1), Some("  ".into()));
        assert!(!comment.has_content());

        comment.reason = Some("moved to done".into());
        assert!(comment.has_content());
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!(CommentTarget::parse("Task", 4).unwrap(), CommentTarget::Task(4));
        assert!(matches!(
            CommentTarget::parse("section", 4),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(CommentTarget::from_columns(Some(1), Some(2)).is_err());
        assert_eq!(CommentTarget::from_columns(None, Some(2)).unwrap().task_id(), Some(2));
    }
}
