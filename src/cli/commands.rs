//! The command tree (spec §4.L): `project`/`plan`/`task`/`schedule`/
//! `pr`/`status`/`mcp-serve`, each a thin wrapper around the domain
//! modules — no business logic lives here.

use clap::{Parser, Subcommand};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "taskctl",
    version = VERSION,
    about = "Decomposes a change request into a DAG of small tasks and coordinates each task's lifecycle",
    after_help = "\
NOTE:
  The database lives at the platform data directory (override with
  TASKCTL_DB_PATH). Run `taskctl project init` inside a git repository
  before any other command for that repository.

EXIT CODES:
  0  Success
  1  User error (not found, invalid transition, validation failure)
  2  External failure (git, forge, or planner call failed)
  3  Internal invariant violation (store backend error)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Project by id, id prefix, or name substring (defaults to the
    /// project whose repo_root matches the current working directory)
    #[arg(long, global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Plan management
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Scheduler operations
    #[command(subcommand)]
    Schedule(ScheduleCommands),

    /// Pull request operations
    #[command(subcommand)]
    Pr(PrCommands),

    /// Show overall plan status
    Status {
        /// Plan by id, id prefix, or title substring
        plan: String,
    },

    /// Run the MCP stdio server over stdin/stdout
    McpServe,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Register the current repository as a taskctl project and
    /// provision its worktree slot pool
    Init {
        /// Project name (defaults to the repo root's directory name)
        #[arg(long)]
        name: Option<String>,
        /// Number of worktree slots to provision
        #[arg(long, default_value = "4")]
        slots: u32,
        /// Maximum number of tasks the scheduler runs concurrently
        #[arg(long)]
        max_concurrency: Option<i32>,
    },
    /// List known projects
    List,
    /// Show project details, including its slot pool
    Show {
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create an empty draft plan
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List plans for the project
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a plan with its tasks, edges, and progress
    Show {
        reference: String,
    },
    /// Send a draft plan to the planner and persist the returned DAG
    #[command(after_help = "\
NOTE:
  Moves the plan draft -> planning before calling the planner, then
  persists the returned tasks and edges and moves planning -> ready.
  If persistence fails after a successful planner call, the plan is
  restored to draft.")]
    Generate {
        reference: String,
        /// Prompt describing the change request
        prompt: String,
        #[arg(long)]
        max_lines_per_task: Option<i32>,
    },
    /// Archive a plan (terminal; reachable from any non-terminal state)
    Archive {
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks in a plan
    List {
        plan: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        level: Option<i32>,
    },
    /// Show a task with its dependencies, dependents, and PR
    Show {
        plan: String,
        task: String,
    },
    /// Move an assigned task to in_progress
    Start {
        plan: String,
        task: String,
    },
    /// Mark a task completed (requires a merged PR unless --force)
    Complete {
        plan: String,
        task: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Compute the next batch of ready tasks and assign them to slots
    Run {
        plan: String,
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// Compute the batch without assigning it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show scheduler progress for a plan
    Status {
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum PrCommands {
    /// Open a forge PR for a task's branch and move it to pr_created
    Create {
        plan: String,
        task: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        draft: bool,
    },
    /// Refresh a task's PR status from the forge
    Sync {
        plan: String,
        task: String,
    },
    /// List pull requests for a plan
    List {
        plan: String,
    },
}
