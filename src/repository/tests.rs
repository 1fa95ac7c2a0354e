//! Repository Integration Tests
//!
//! Tests for the SQLite repositories with an in-memory database.

#[cfg(test)]
mod tests {
    use crate::domain::{
        Comment, CommentTarget, ContainerRef, DomainError, Project, ReactionTarget, Section, Tag, Task,
    };
    use crate::repository::{
        init_db, CommentOperations, CommentRepository, DbState, PositionedRepository, ProjectRepository,
        ReactionOperations, ReactionRepository, Repository, SectionRepository, TagRepository, TaskRepository,
        TaskTagOperations, Transactional, IN_MEMORY,
    };
    use chrono::NaiveDate;
    use std::path::Path;

    struct Repos {
        db: DbState,
        projects: ProjectRepository,
        sections: SectionRepository,
        tasks: TaskRepository,
        tags: TagRepository,
        comments: CommentRepository,
        reactions: ReactionRepository,
    }

    async fn setup_test_db() -> Repos {
        // Use in-memory database for tests
        let db = init_db(Path::new(IN_MEMORY)).await.expect("Failed to init test DB");
        Repos {
            projects: ProjectRepository::new(db.conn.clone()),
            sections: SectionRepository::new(db.conn.clone()),
            tasks: TaskRepository::new(db.conn.clone()),
            tags: TagRepository::new(db.conn.clone()),
            comments: CommentRepository::new(db.conn.clone()),
            reactions: ReactionRepository::new(db.conn.clone()),
            db,
        }
    }

    /// Run raw SQL behind the repositories' back
    async fn execute(repos: &Repos, sql: &str) {
        let guard = repos.db.conn.lock().await;
        guard.as_ref().unwrap().execute_batch(sql).unwrap();
    }

    async fn project(repos: &Repos, name: &str) -> Project {
        repos
            .projects
            .create(&Project::new(0, name.to_string()))
            .await
            .expect("Failed to create project")
    }

    #[tokio::test]
    async fn test_create_and_find_project() {
        let repos = setup_test_db().await;

        let created = project(&repos, "Home").await;
        assert!(created.id > 0);
        assert!(created.created_at.is_some());

        let found = repos.projects.find_by_id(created.id).await.expect("Find failed");
        assert_eq!(found.unwrap().name, "Home");
    }

    #[tokio::test]
    async fn test_update_missing_project_is_not_found() {
        let repos = setup_test_db().await;

        let ghost = Project::new(42, "Ghost".to_string());
        let err = repos.projects.update(&ghost).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("project", 42));
        assert!(repos.projects.delete(42).await.is_err());
    }

    #[tokio::test]
    async fn test_sections_listed_in_order() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;

        for (order, name) in ["Later", "Now"].iter().enumerate() {
            let mut section = Section::new(0, name.to_string(), home.id);
            section.order = 1 - order as i32;
            repos.sections.create(&section).await.unwrap();
        }

        let children = repos.sections.children_of(ContainerRef::Project(home.id)).await.unwrap();
        let names: Vec<_> = children.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Now", "Later"]);

        // Sections never live in tasks
        let none = repos.sections.children_of(ContainerRef::Task(1)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_task_placement_persistence() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let section = repos.sections.create(&Section::new(0, "Now".to_string(), home.id)).await.unwrap();

        let parent = repos
            .tasks
            .create(&Task::new(0, "Parent".to_string(), ContainerRef::Section(section.id)))
            .await
            .unwrap();
        let mut child = Task::new(0, "Child".to_string(), ContainerRef::Task(parent.id));
        child.deadline = NaiveDate::from_ymd_opt(2026, 3, 1);
        let child = repos.tasks.create(&child).await.unwrap();

        let found = repos.tasks.find_by_id(child.id).await.unwrap().unwrap();
        assert_eq!(found.container, ContainerRef::Task(parent.id));
        assert_eq!(found.deadline, NaiveDate::from_ymd_opt(2026, 3, 1));

        let in_section = repos.tasks.children_of(ContainerRef::Section(section.id)).await.unwrap();
        assert_eq!(in_section.len(), 1);
        assert_eq!(in_section[0].id, parent.id);
    }

    #[tokio::test]
    async fn test_move_task_switches_columns() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let section = repos.sections.create(&Section::new(0, "Now".to_string(), home.id)).await.unwrap();

        let mut task = repos
            .tasks
            .create(&Task::new(0, "Wander".to_string(), ContainerRef::Project(home.id)))
            .await
            .unwrap();
        task.container = ContainerRef::Section(section.id);
        repos.tasks.update(&task).await.unwrap();

        let found = repos.tasks.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(found.project_id(), None);
        assert_eq!(found.section_id(), Some(section.id));
        assert!(repos.tasks.children_of(ContainerRef::Project(home.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_order() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let task = repos
            .tasks
            .create(&Task::new(0, "Reorder me".to_string(), ContainerRef::Project(home.id)))
            .await
            .unwrap();

        repos.tasks.set_order(task.id, 5).await.unwrap();
        let found = repos.tasks.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(found.order, 5);
        assert!(repos.tasks.set_order(999, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_tag_name_conflicts() {
        let repos = setup_test_db().await;

        repos.tags.create(&Tag::new(0, "Urgent".to_string(), None)).await.unwrap();
        let err = repos.tags.create(&Tag::new(0, " urgent ".to_string(), None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_tag_name_folds_unicode_case() {
        let repos = setup_test_db().await;

        let tag = repos.tags.create(&Tag::new(0, "Ärger".to_string(), None)).await.unwrap();
        let err = repos.tags.create(&Tag::new(0, "ärger".to_string(), None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // Renaming a tag to its own name in another case is not a clash
        let renamed = Tag::new(tag.id, "ÄRGER".to_string(), None);
        assert_eq!(repos.tags.update(&renamed).await.unwrap().name, "ÄRGER");
    }

    #[tokio::test]
    async fn test_oversized_row_id_is_rejected() {
        let repos = setup_test_db().await;
        repos.tags.create(&Tag::new(0, "first".to_string(), None)).await.unwrap();

        execute(&repos, "UPDATE sqlite_sequence SET seq = 4294967295 WHERE name = 'tags'").await;
        let err = repos.tags.create(&Tag::new(0, "second".to_string(), None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_malformed_deadline_is_an_error() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let mut task = Task::new(0, "Due".to_string(), ContainerRef::Project(home.id));
        task.deadline = NaiveDate::from_ymd_opt(2026, 1, 31);
        let task = repos.tasks.create(&task).await.unwrap();
        assert_eq!(
            repos.tasks.find_by_id(task.id).await.unwrap().unwrap().deadline,
            NaiveDate::from_ymd_opt(2026, 1, 31)
        );

        execute(&repos, "UPDATE tasks SET deadline = 'soon'; UPDATE projects SET deadline = '31/01/2026';").await;
        assert!(matches!(repos.tasks.find_by_id(task.id).await, Err(DomainError::Internal(_))));
        assert!(matches!(repos.tasks.list().await, Err(DomainError::Internal(_))));
        assert!(matches!(repos.projects.find_by_id(home.id).await, Err(DomainError::Internal(_))));
    }

    #[tokio::test]
    async fn test_project_settings_round_trip() {
        let repos = setup_test_db().await;
        let mut garden = Project::new(0, "Garden".to_string());
        garden.deadline = NaiveDate::from_ymd_opt(2026, 6, 21);
        garden.accent_color = Some("#228B22".to_string());
        garden.icon = Some("sprout".to_string());
        garden.show_completed_tasks = true;

        let created = repos.projects.create(&garden).await.unwrap();
        let found = repos.projects.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_comment_threads_cascade() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let task = repos
            .tasks
            .create(&Task::new(0, "Discuss".to_string(), ContainerRef::Project(home.id)))
            .await
            .unwrap();

        let root = repos
            .comments
            .create(&Comment::new(0, CommentTarget::Task(task.id), Some("Thoughts?".to_string())))
            .await
            .unwrap();
        let reply = repos
            .comments
            .create(&Comment::reply_to(0, &root, Some("Ship it".to_string())))
            .await
            .unwrap();
        repos.reactions.add_reaction(ReactionTarget::Comment(reply.id), "🚀", 2).await.unwrap();

        assert_eq!(repos.comments.comments_on(CommentTarget::Task(task.id)).await.unwrap(), vec![root.clone()]);
        assert_eq!(repos.comments.replies_to(root.id).await.unwrap(), vec![reply.clone()]);

        repos.tasks.delete(task.id).await.unwrap();
        assert!(repos.comments.list().await.unwrap().is_empty());
        assert!(repos
            .reactions
            .reactions_on(ReactionTarget::Comment(reply.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_task_tag_links() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let task = repos
            .tasks
            .create(&Task::new(0, "Tagged".to_string(), ContainerRef::Project(home.id)))
            .await
            .unwrap();
        let urgent = repos.tags.create(&Tag::new(0, "urgent".to_string(), None)).await.unwrap();
        let chores = repos.tags.create(&Tag::new(0, "Chores".to_string(), None)).await.unwrap();

        repos.tags.add_tag_to_task(task.id, urgent.id).await.unwrap();
        repos.tags.add_tag_to_task(task.id, chores.id).await.unwrap();
        assert!(matches!(
            repos.tags.add_tag_to_task(task.id, urgent.id).await,
            Err(DomainError::Conflict(_))
        ));

        let names: Vec<_> = repos
            .tags
            .tags_for_task(task.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Chores", "urgent"]);

        let tagged = repos.tags.tasks_with_tag(urgent.id).await.unwrap();
        assert_eq!(tagged.len(), 1);

        repos.tags.remove_tag_from_task(task.id, urgent.id).await.unwrap();
        assert!(repos.tags.remove_tag_from_task(task.id, urgent.id).await.is_err());
        assert!(repos.tags.tasks_with_tag(urgent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_tag_drops_links() {
        let repos = setup_test_db().await;
        let home = project(&repos, "Home").await;
        let task = repos
            .tasks
            .create(&Task::new(0, "Tagged".to_string(), ContainerRef::Project(home.id)))
            .await
            .unwrap();
        let tag = repos.tags.create(&Tag::new(0, "urgent".to_string(), None)).await.unwrap();
        repos.tags.add_tag_to_task(task.id, tag.id).await.unwrap();

        repos.tags.delete(tag.id).await.unwrap();
        assert!(repos.tags.tags_for_task(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let repos = setup_test_db().await;

        repos.db.begin().await.unwrap();
        project(&repos, "Temporary").await;
        repos.db.rollback().await.unwrap();

        assert!(repos.projects.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_keeps_writes() {
        let repos = setup_test_db().await;

        repos.db.begin().await.unwrap();
        project(&repos, "Kept").await;
        repos.db.commit().await.unwrap();

        assert_eq!(repos.projects.list().await.unwrap().len(), 1);
    }
}
