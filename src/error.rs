//! Error taxonomy (spec §7): domain errors, external (git/forge/planner)
//! errors, store errors, and cancellation/timeout — folded into one enum
//! so every layer (CLI, MCP, scheduler) can match on it uniformly. Shaped
//! after the teacher's `TaskaiError` (code + message) but as a proper
//! `thiserror` enum now that there are several structurally distinct
//! error families instead of one flat message.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Ambiguous,
    InvalidTransition,
    Cycle,
    DependencyUnmet,
    AlreadyExists,
    Conflict,
    Invalid,
    Backend,
    GitError,
    ForgeError,
    PlannerError,
    Cancelled,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Ambiguous => "AMBIGUOUS",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::Cycle => "CYCLE",
            Self::DependencyUnmet => "DEPENDENCY_UNMET",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Conflict => "CONFLICT",
            Self::Invalid => "INVALID",
            Self::Backend => "BACKEND",
            Self::GitError => "GIT_ERROR",
            Self::ForgeError => "FORGE_ERROR",
            Self::PlannerError => "PLANNER_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// Process exit code this error family maps to (spec §6: 1 user error,
    /// 2 external failure, 3 internal invariant violation).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Backend => 3,
            Self::GitError | Self::ForgeError | Self::PlannerError | Self::Timeout => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {reference}")]
    NotFound { entity: &'static str, reference: String },

    #[error("ambiguous reference '{reference}'. Candidates: {}", candidates.join(", "))]
    Ambiguous { reference: String, candidates: Vec<String> },

    #[error("invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition { entity: &'static str, from: String, to: String },

    #[error("dependency cycle detected involving {involving}")]
    Cycle { involving: String },

    #[error("task {task_id} is blocked by unfinished dependencies")]
    DependencyUnmet { task_id: String },

    #[error("{entity} already exists: {reference}")]
    AlreadyExists { entity: &'static str, reference: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid: {0}")]
    Invalid(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("git error running `{command}`: {stderr}")]
    Git { command: String, stderr: String },

    #[error("forge error running `{command}`: {stderr}")]
    Forge { command: String, stderr: String },

    #[error("planner error: {0}")]
    Planner(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Ambiguous { .. } => ErrorCode::Ambiguous,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::Cycle { .. } => ErrorCode::Cycle,
            Self::DependencyUnmet { .. } => ErrorCode::DependencyUnmet,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::Invalid(_) => ErrorCode::Invalid,
            Self::Backend(_) => ErrorCode::Backend,
            Self::Git { .. } => ErrorCode::GitError,
            Self::Forge { .. } => ErrorCode::ForgeError,
            Self::Planner(_) => ErrorCode::PlannerError,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Timeout(_) => ErrorCode::Timeout,
        }
    }

    pub fn not_found(entity: &'static str, reference: impl Into<String>) -> Self {
        Self::NotFound { entity, reference: reference.into() }
    }

    pub fn ambiguous(reference: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::Ambiguous { reference: reference.into(), candidates }
    }

    pub fn invalid_transition(entity: &'static str, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition { entity, from: from.into(), to: to.into() }
    }

    pub fn cycle(involving: impl Into<String>) -> Self {
        Self::Cycle { involving: involving.into() }
    }

    pub fn dependency_unmet(task_id: impl Into<String>) -> Self {
        Self::DependencyUnmet { task_id: task_id.into() }
    }

    pub fn already_exists(entity: &'static str, reference: impl Into<String>) -> Self {
        Self::AlreadyExists { entity, reference: reference.into() }
    }

    pub fn git(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Git { command: command.into(), stderr: stderr.into() }
    }

    pub fn forge(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Forge { command: command.into(), stderr: stderr.into() }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound {
                entity: "row",
                reference: String::new(),
            },
            rusqlite::Error::SqliteFailure(ref sqlite_err, _)
                if sqlite_err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(e.to_string())
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
