//! Slot (spec §3): a reusable git-worktree workspace bound to a project.
//! Status lifecycle: available -> assigned -> in_progress -> pr_pending ->
//! completed -> available; `error` is reachable from any active state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Assigned,
    InProgress,
    PrPending,
    Completed,
    Error,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PrPending => "pr_pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "pr_pending" => Some(Self::PrPending),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Available)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub path: String,
    pub branch: Option<String>,
    pub status: SlotStatus,
    pub task_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
