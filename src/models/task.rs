//! Task (spec §3): a leaf unit of work owned by a plan, the unit the
//! scheduler moves through the slot pool.
//!
//! Status lifecycle: pending -> ready -> assigned -> in_progress ->
//! pr_created -> in_review -> completed; `blocked` is reachable from
//! `pending`/`ready` when a dependency becomes infeasible.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Ready,
    Assigned,
    InProgress,
    PrCreated,
    InReview,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PrCreated => "pr_created",
            Self::InReview => "in_review",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "ready" => Some(Self::Ready),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "pr_created" => Some(Self::PrCreated),
            "in_review" => Some(Self::InReview),
            "completed" => Some(Self::Completed),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Statuses for which spec invariant 1 requires `branch_name` to be set.
    pub fn requires_branch(&self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::PrCreated | Self::InReview)
    }

    /// The "currently being worked" set the scheduler tracks as `in_progress`
    /// (spec §4.F state: assigned/in_progress/pr_created/in_review).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::PrCreated | Self::InReview)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub plan_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub level: i32,
    pub estimated_lines: Option<i32>,
    pub branch_name: Option<String>,
    pub slot_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
