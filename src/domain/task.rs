//! Task Entity
//!
//! A task lives in exactly one container: a project, a section, or a parent
//! task (making it a subtask). The placement is an explicit [`ContainerRef`]
//! rather than three optional ids.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::container::{ContainerKind, ContainerRef};
use super::entity::{Entity, Positioned};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    /// Position among the container's tasks
    pub order: i32,
    pub container: ContainerRef,
    pub is_done: bool,
    /// When the task was last completed (unix millis)
    pub done_at: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Task {
    pub fn new(id: u32, name: String, container: ContainerRef) -> Self {
        Self {
            id,
            name,
            description: None,
            order: 0,
            container,
            is_done: false,
            done_at: None,
            deadline: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn project_id(&self) -> Option<u32> {
        self.container.project_id()
    }

    pub fn section_id(&self) -> Option<u32> {
        self.container.section_id()
    }

    pub fn parent_task_id(&self) -> Option<u32> {
        self.container.parent_task_id()
    }

    /// Check if this is a subtask
    pub fn is_subtask(&self) -> bool {
        self.container.kind() == ContainerKind::Task
    }

    /// Set completion. `done_at` only changes when the flag actually flips.
    pub fn set_done(&mut self, done: bool, now_millis: i64) {
        if done == self.is_done {
            return;
        }
        self.is_done = done;
        self.done_at = if done { Some(now_millis) } else { None };
    }
}

impl Entity for Task {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Positioned for Task {
    const NAME: &'static str = "task";

    fn accepts(_kind: ContainerKind) -> bool {
        true
    }

    fn container(&self) -> ContainerRef {
        self.container
    }

    fn set_container(&mut self, container: ContainerRef) {
        self.container = container;
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}
