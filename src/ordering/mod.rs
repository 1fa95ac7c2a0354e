//! Ordering Engine
//!
//! Keeps tasks and sections densely numbered (0..n) inside their container
//! across create, delete and move.

mod order_manager;
mod policy;
mod resolver;

pub use order_manager::OrderManager;
pub use policy::InsertPosition;
pub use resolver::ContainerResolver;
