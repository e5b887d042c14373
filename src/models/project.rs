//! Project (spec §3): one per managed repository.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub repo_root: String,
    pub remote_url: Option<String>,
    pub main_branch: String,
    pub max_concurrency: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}
