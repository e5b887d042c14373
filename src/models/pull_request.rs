//! PullRequest (spec §3): a forge-side artefact bound 1:1 to a task.
//! Status lifecycle: draft -> open -> in_review -> approved -> merged;
//! `closed` reachable from `open`/`in_review`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestStatus {
    Draft,
    Open,
    InReview,
    Approved,
    Merged,
    Closed,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Merged => "merged",
            Self::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "open" => Some(Self::Open),
            "in_review" => Some(Self::InReview),
            "approved" => Some(Self::Approved),
            "merged" => Some(Self::Merged),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged | Self::Closed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: String,
    pub task_id: String,
    pub number: i64,
    pub url: String,
    pub status: PullRequestStatus,
    pub base_branch: String,
    pub head_branch: String,
    pub created_at: String,
    pub updated_at: String,
}
