//! Insert Policy
//!
//! Where a new item lands when the caller does not ask for an order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    /// Order 0, pushing existing siblings down
    #[default]
    Front,
    /// After the last sibling
    Back,
}

impl InsertPosition {
    /// Order for a new item in a container that has `sibling_count` children
    pub fn order_for(&self, sibling_count: usize) -> i32 {
        match self {
            InsertPosition::Front => 0,
            InsertPosition::Back => sibling_count as i32,
        }
    }
}
