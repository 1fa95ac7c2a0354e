//! Application State
//!
//! Owns the stores and ordering engines the commands work through. Every
//! mutating command runs under the writer lock inside one store transaction.

use log::{error, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::BoardConfig;
use crate::domain::{DomainResult, Project, Section, Tag, Task};
use crate::ordering::{ContainerResolver, OrderManager};
use crate::repository::{
    init_db, CommentOperations, CommentRepository, MemoryStore, PositionedRepository, ProjectRepository,
    ReactionOperations, ReactionRepository, Repository, SectionRepository, TagRepository, TaskRepository,
    TaskTagOperations, Transactional,
};

/// Application state shared across commands
pub struct AppState {
    pub config: BoardConfig,
    pub projects: Arc<dyn Repository<Project>>,
    pub sections: OrderManager<Section>,
    pub tasks: OrderManager<Task>,
    pub tags: Arc<dyn Repository<Tag>>,
    pub task_tags: Arc<dyn TaskTagOperations>,
    pub comments: Arc<dyn CommentOperations>,
    pub reactions: Arc<dyn ReactionOperations>,
    pub resolver: ContainerResolver,
    /// Field updates that leave order and placement alone
    pub(crate) section_store: Arc<dyn Repository<Section>>,
    pub(crate) task_store: Arc<dyn Repository<Task>>,
    tx: Arc<dyn Transactional>,
    writer: Mutex<()>,
}

/// Stores that need no ordering engine
struct Stores {
    projects: Arc<dyn Repository<Project>>,
    tags: Arc<dyn Repository<Tag>>,
    task_tags: Arc<dyn TaskTagOperations>,
    comments: Arc<dyn CommentOperations>,
    reactions: Arc<dyn ReactionOperations>,
    tx: Arc<dyn Transactional>,
}

impl AppState {
    /// Build the state the configuration asks for
    pub async fn open(config: BoardConfig) -> DomainResult<Self> {
        let Some(path) = config.database_path.clone() else {
            return Ok(Self::in_memory(config));
        };

        let db = init_db(&path).await?;
        let tags = Arc::new(TagRepository::new(db.conn.clone()));
        let stores = Stores {
            projects: Arc::new(ProjectRepository::new(db.conn.clone())),
            tags: tags.clone(),
            task_tags: tags,
            comments: Arc::new(CommentRepository::new(db.conn.clone())),
            reactions: Arc::new(ReactionRepository::new(db.conn.clone())),
            tx: Arc::new(db.clone()),
        };
        Ok(Self::assemble(
            config,
            Arc::new(SectionRepository::new(db.conn.clone())),
            Arc::new(TaskRepository::new(db.conn.clone())),
            stores,
        ))
    }

    pub fn in_memory(config: BoardConfig) -> Self {
        Self::with_memory_store(config, Arc::new(MemoryStore::new()))
    }

    /// State over an existing memory store
    pub fn with_memory_store(config: BoardConfig, store: Arc<MemoryStore>) -> Self {
        let stores = Stores {
            projects: store.clone(),
            tags: store.clone(),
            task_tags: store.clone(),
            comments: store.clone(),
            reactions: store.clone(),
            tx: store.clone(),
        };
        Self::assemble(config, store.clone(), store, stores)
    }

    fn assemble<S, T>(config: BoardConfig, sections: Arc<S>, tasks: Arc<T>, stores: Stores) -> Self
    where
        S: PositionedRepository<Section> + 'static,
        T: PositionedRepository<Task> + 'static,
    {
        let insert_position = config.insert_position;
        let section_store: Arc<dyn Repository<Section>> = sections.clone();
        let task_store: Arc<dyn Repository<Task>> = tasks.clone();

        Self {
            resolver: ContainerResolver::new(stores.projects.clone(), section_store.clone(), task_store.clone()),
            sections: OrderManager::new(sections, insert_position),
            tasks: OrderManager::new(tasks, insert_position),
            config,
            projects: stores.projects,
            tags: stores.tags,
            task_tags: stores.task_tags,
            comments: stores.comments,
            reactions: stores.reactions,
            section_store,
            task_store,
            tx: stores.tx,
            writer: Mutex::new(()),
        }
    }

    /// Run `op` as one unit of work. Errors roll back everything it wrote.
    pub(crate) async fn transaction<R, F>(&self, op: F) -> DomainResult<R>
    where
        F: Future<Output = DomainResult<R>>,
    {
        let _writer = self.writer.lock().await;
        self.tx.begin().await?;

        let result = match op.await {
            Ok(value) => match self.tx.commit().await {
                Ok(()) => return Ok(value),
                Err(err) => err,
            },
            Err(err) => err,
        };

        warn!("rolling back: {}", result);
        if let Err(rollback_err) = self.tx.rollback().await {
            error!("rollback failed: {}", rollback_err);
        }
        Err(result)
    }
}
