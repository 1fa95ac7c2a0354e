//! Commands Layer
//!
//! Request handlers over [`AppState`]. Mutating handlers run as a single
//! transaction; reads go straight to the stores.

mod comment_cmd;
mod project_cmd;
mod reaction_cmd;
mod section_cmd;
mod state;
mod tag_cmd;
mod task_cmd;

pub use comment_cmd::*;
pub use project_cmd::*;
pub use reaction_cmd::*;
pub use section_cmd::*;
pub use state::AppState;
pub use tag_cmd::*;
pub use task_cmd::{
    create_task, delete_task, get_children, get_descendants, get_task, move_task, toggle_task,
    update_task, ContainerTag, TaskCreateParams, TaskMove, TaskUpdateParams,
};
