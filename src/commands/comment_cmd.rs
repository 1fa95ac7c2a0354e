//! Commands for Comments
//!
//! Threaded discussion on projects and tasks. Deleting a comment takes its
//! replies and reactions with it.

use log::info;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::domain::{Comment, CommentTarget, DomainError, DomainResult};

/// Text of a new or edited comment. At least one of `body` and `reason`
/// must hold something other than whitespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentInput {
    pub body: Option<String>,
    pub reason: Option<String>,
    pub owner_id: Option<u32>,
}

fn require_content(comment: &Comment) -> DomainResult<()> {
    if comment.has_content() {
        Ok(())
    } else {
        Err(DomainError::InvalidInput("comment must have a body or a reason".into()))
    }
}

async fn ensure_target(state: &AppState, target: CommentTarget) -> DomainResult<()> {
    match target {
        CommentTarget::Project(id) => state
            .projects
            .find_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("project", id)),
        CommentTarget::Task(id) => state.tasks.get(id).await.map(|_| ()),
    }
}

/// Start a thread on a project or task named by type tag
pub async fn add_comment(
    state: &AppState,
    target_type: &str,
    target_id: u32,
    input: CommentInput,
) -> DomainResult<Comment> {
    let target = CommentTarget::parse(target_type, target_id)?;
    let mut comment = Comment::new(0, target, input.body);
    comment.reason = input.reason;
    comment.owner_id = input.owner_id;
    require_content(&comment)?;

    state
        .transaction(async {
            ensure_target(state, target).await?;
            let created = state.comments.create(&comment).await?;
            info!("comment {} added on {}", created.id, target);
            Ok(created)
        })
        .await
}

/// Answer a comment. The reply lands on the parent's project or task.
pub async fn reply_to_comment(state: &AppState, parent_id: u32, input: CommentInput) -> DomainResult<Comment> {
    state
        .transaction(async {
            let parent = get_comment(state, parent_id).await?;
            let mut reply = Comment::reply_to(0, &parent, input.body);
            reply.reason = input.reason;
            reply.owner_id = input.owner_id;
            require_content(&reply)?;
            state.comments.create(&reply).await
        })
        .await
}

pub async fn get_comment(state: &AppState, id: u32) -> DomainResult<Comment> {
    state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("comment", id))
}

/// Top-level comments on a project or task, oldest first
pub async fn list_comments(state: &AppState, target_type: &str, target_id: u32) -> DomainResult<Vec<Comment>> {
    let target = CommentTarget::parse(target_type, target_id)?;
    ensure_target(state, target).await?;
    state.comments.comments_on(target).await
}

pub async fn get_replies(state: &AppState, comment_id: u32) -> DomainResult<Vec<Comment>> {
    get_comment(state, comment_id).await?;
    state.comments.replies_to(comment_id).await
}

/// Edit the text of a comment. Unset fields keep their value; the author
/// and thread never change.
pub async fn update_comment(state: &AppState, id: u32, input: CommentInput) -> DomainResult<Comment> {
    state
        .transaction(async {
            let existing = get_comment(state, id).await?;
            let updated = Comment {
                body: input.body.or(existing.body),
                reason: input.reason.or(existing.reason),
                ..existing
            };
            require_content(&updated)?;
            state.comments.update(&updated).await
        })
        .await
}

pub async fn delete_comment(state: &AppState, id: u32) -> DomainResult<()> {
    state
        .transaction(async {
            get_comment(state, id).await?;
            state.comments.delete(id).await
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create_project, create_task, delete_project, delete_task, TaskCreateParams};
    use crate::config::BoardConfig;

    async fn states() -> Vec<AppState> {
        vec![
            AppState::in_memory(BoardConfig::default()),
            AppState::open(BoardConfig::sqlite(crate::repository::IN_MEMORY))
                .await
                .unwrap(),
        ]
    }

    fn said(body: &str) -> CommentInput {
        CommentInput {
            body: Some(body.to_string()),
            owner_id: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_threads_on_tasks() {
        for state in states().await {
            let project = create_project(&state, "House".into(), None).await.unwrap();
            let task = create_task(
                &state,
                TaskCreateParams {
                    name: "Fix roof".into(),
                    project_id: Some(project.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

            let first = add_comment(&state, "task", task.id, said("Got a quote")).await.unwrap();
            let second = add_comment(&state, "task", task.id, said("Booked for Monday")).await.unwrap();
            let reply = reply_to_comment(&state, first.id, said("How much?")).await.unwrap();
            assert_eq!(reply.target, CommentTarget::Task(task.id));
            assert_eq!(reply.parent_comment_id, Some(first.id));

            let top: Vec<u32> = list_comments(&state, "task", task.id)
                .await
                .unwrap()
                .into_iter()
                .map(|c| c.id)
                .collect();
            assert_eq!(top, vec![first.id, second.id]);
            assert_eq!(get_replies(&state, first.id).await.unwrap(), vec![reply.clone()]);

            let edited = update_comment(
                &state,
                second.id,
                CommentInput {
                    reason: Some("rescheduled".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(edited.body.as_deref(), Some("Booked for Monday"));
            assert_eq!(edited.reason.as_deref(), Some("rescheduled"));

            delete_comment(&state, first.id).await.unwrap();
            assert!(matches!(get_comment(&state, reply.id).await, Err(DomainError::NotFound(_))));
            assert_eq!(list_comments(&state, "task", task.id).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_comments_are_validated() {
        for state in states().await {
            let project = create_project(&state, "House".into(), None).await.unwrap();

            assert!(matches!(
                add_comment(&state, "project", project.id, said("   ")).await,
                Err(DomainError::InvalidInput(_))
            ));
            assert!(matches!(
                add_comment(&state, "section", project.id, said("hi")).await,
                Err(DomainError::InvalidInput(_))
            ));
            assert!(matches!(
                add_comment(&state, "task", 404, said("hi")).await,
                Err(DomainError::NotFound(_))
            ));
            assert!(matches!(
                reply_to_comment(&state, 404, said("hi")).await,
                Err(DomainError::NotFound(_))
            ));

            let comment = add_comment(&state, "project", project.id, said("Kickoff")).await.unwrap();
            let blank = CommentInput {
                body: Some(" ".into()),
                ..Default::default()
            };
            assert!(matches!(
                update_comment(&state, comment.id, blank).await,
                Err(DomainError::InvalidInput(_))
            ));
            assert_eq!(get_comment(&state, comment.id).await.unwrap().body.as_deref(), Some("Kickoff"));
        }
    }

    #[tokio::test]
    async fn test_comments_go_with_their_target() {
        for state in states().await {
            let project = create_project(&state, "House".into(), None).await.unwrap();
            let task = create_task(
                &state,
                TaskCreateParams {
                    name: "Paint".into(),
                    project_id: Some(project.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            let on_task = add_comment(&state, "task", task.id, said("Which color?")).await.unwrap();
            let on_project = add_comment(&state, "project", project.id, said("Budget set")).await.unwrap();

            delete_task(&state, task.id).await.unwrap();
            assert!(get_comment(&state, on_task.id).await.is_err());
            assert!(get_comment(&state, on_project.id).await.is_ok());

            delete_project(&state, project.id).await.unwrap();
            assert!(get_comment(&state, on_project.id).await.is_err());
        }
    }
}
