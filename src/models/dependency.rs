//! TaskDependency (spec §3): a directed edge `task depends on
//! depends_on_id`, both within the same plan. No self-loop, no duplicate
//! edge, no cycle across the plan's edge set (enforced by [`crate::graph`]
//! and the `task_deps` table's own CHECK constraint).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDependency {
    pub task_id: String,
    pub depends_on_id: String,
}
