//! Commands for Reactions

use super::state::AppState;
use crate::domain::{DomainResult, Reaction, ReactionTarget};

/// React to a task or comment on behalf of `user_id`
pub async fn add_reaction(
    state: &AppState,
    target: ReactionTarget,
    emoji: &str,
    user_id: u32,
) -> DomainResult<Reaction> {
    let emoji = Reaction::normalize_emoji(emoji)?;
    state
        .transaction(async { state.reactions.add_reaction(target, &emoji, user_id).await })
        .await
}

/// Withdraw a user's reaction. `None` means nobody reacts with that emoji
/// any more.
pub async fn remove_reaction(
    state: &AppState,
    target: ReactionTarget,
    emoji: &str,
    user_id: u32,
) -> DomainResult<Option<Reaction>> {
    let emoji = Reaction::normalize_emoji(emoji)?;
    state
        .transaction(async { state.reactions.remove_reaction(target, &emoji, user_id).await })
        .await
}

pub async fn get_reactions(state: &AppState, target: ReactionTarget) -> DomainResult<Vec<Reaction>> {
    state.reactions.reactions_on(target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{add_comment, create_project, create_task, delete_comment, CommentInput, TaskCreateParams};
    use crate::config::BoardConfig;
    use crate::domain::DomainError;

    async fn states() -> Vec<AppState> {
        vec![
            AppState::in_memory(BoardConfig::default()),
            AppState::open(BoardConfig::sqlite(crate::repository::IN_MEMORY))
                .await
                .unwrap(),
        ]
    }

    async fn task_in_new_project(state: &AppState) -> u32 {
        let project = create_project(state, "Trip".into(), None).await.unwrap();
        create_task(
            state,
            TaskCreateParams {
                name: "Book hotel".into(),
                project_id: Some(project.id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_users_share_one_reaction() {
        for state in states().await {
            let target = ReactionTarget::Task(task_in_new_project(&state).await);

            let first = add_reaction(&state, target, "👍", 7).await.unwrap();
            let second = add_reaction(&state, target, " 👍 ", 3).await.unwrap();
            assert_eq!(first.id, second.id);
            assert_eq!(second.user_ids, vec![3, 7]);

            add_reaction(&state, target, "🎉", 3).await.unwrap();
            let emojis: Vec<String> = get_reactions(&state, target)
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.emoji)
                .collect();
            assert_eq!(emojis, vec!["👍", "🎉"]);

            assert!(matches!(
                add_reaction(&state, target, "👍", 7).await,
                Err(DomainError::Conflict(_))
            ));
            assert_eq!(get_reactions(&state, target).await.unwrap()[0].count(), 2);
        }
    }

    #[tokio::test]
    async fn test_last_user_removes_reaction() {
        for state in states().await {
            let target = ReactionTarget::Task(task_in_new_project(&state).await);
            add_reaction(&state, target, "👀", 1).await.unwrap();
            add_reaction(&state, target, "👀", 2).await.unwrap();

            let left = remove_reaction(&state, target, "👀", 1).await.unwrap();
            assert_eq!(left.map(|r| r.user_ids), Some(vec![2]));
            assert_eq!(remove_reaction(&state, target, "👀", 2).await.unwrap(), None);
            assert!(get_reactions(&state, target).await.unwrap().is_empty());

            assert!(matches!(
                remove_reaction(&state, target, "👀", 2).await,
                Err(DomainError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_reactions_on_comments() {
        for state in states().await {
            let task_id = task_in_new_project(&state).await;
            let comment = add_comment(
                &state,
                "task",
                task_id,
                CommentInput {
                    body: Some("Found one by the lake".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            let target = ReactionTarget::Comment(comment.id);

            add_reaction(&state, target, "❤️", 4).await.unwrap();
            assert!(get_reactions(&state, ReactionTarget::Task(task_id)).await.unwrap().is_empty());

            delete_comment(&state, comment.id).await.unwrap();
            assert!(get_reactions(&state, target).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_reaction_input_is_checked() {
        for state in states().await {
            let target = ReactionTarget::Task(task_in_new_project(&state).await);

            assert!(matches!(
                add_reaction(&state, target, "  ", 1).await,
                Err(DomainError::InvalidInput(_))
            ));
            assert!(matches!(
                add_reaction(&state, ReactionTarget::Comment(99), "👍", 1).await,
                Err(DomainError::NotFound(_))
            ));
            assert!(matches!(
                add_reaction(&state, ReactionTarget::Task(99), "👍", 1).await,
                Err(DomainError::NotFound(_))
            ));
        }
    }
}
