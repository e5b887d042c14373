//! Query surface (spec §4.H): pure read projections shared by the CLI
//! and the MCP stdio server. Every lookup accepts an identity prefix via
//! the `resolve_*` helpers in `db::*_repo`.

use serde::Serialize;

use crate::db::connection::Store;
use crate::db::{dependency_repo, plan_repo, pr_repo, project_repo, task_repo};
use crate::error::Result;
use crate::models::{Plan, PullRequest, Task};

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub pending: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanWithProgress {
    pub plan: Plan,
    pub tasks: Vec<Task>,
    pub edges: Vec<(String, String)>,
    pub progress: ProgressSummary,
}

/// `plan_with_progress(plan_id)` (spec §4.H).
pub fn plan_with_progress(store: &Store, plan_reference: &str, project_id: &str) -> Result<PlanWithProgress> {
    let conn = store.lock();
    let plan = plan_repo::resolve_plan(&conn, project_id, plan_reference)?;
    let tasks = task_repo::list_tasks_by_plan(&conn, &plan.id)?;
    let edges = dependency_repo::get_all_dependencies_for_plan(&conn, &plan.id)?
        .into_iter()
        .map(|d| (d.task_id, d.depends_on_id))
        .collect();
    let raw_progress = task_repo::task_progress(&conn, &plan.id)?;
    let in_progress = raw_progress.assigned + raw_progress.in_progress + raw_progress.pr_created + raw_progress.in_review;

    Ok(PlanWithProgress {
        plan,
        tasks,
        edges,
        progress: ProgressSummary {
            total: raw_progress.total,
            completed: raw_progress.completed,
            in_progress,
            pending: raw_progress.pending + raw_progress.blocked + raw_progress.ready,
            percent: raw_progress.percentage,
        },
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct NeighbourTask {
    pub id: String,
    pub title: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskWithNeighbours {
    pub task: Task,
    pub dependencies: Vec<NeighbourTask>,
    pub dependents: Vec<NeighbourTask>,
    pub pull_request: Option<PullRequest>,
    pub plan: Plan,
}

/// `task_with_neighbours(task_id)` (spec §4.H).
pub fn task_with_neighbours(store: &Store, plan_id: &str, task_reference: &str) -> Result<TaskWithNeighbours> {
    let conn = store.lock();
    let task = task_repo::resolve_task(&conn, plan_id, task_reference)?;
    let plan = plan_repo::get_plan_by_id(&conn, &task.plan_id)?;

    let dependency_ids = dependency_repo::get_dependencies(&conn, &task.id)?;
    let dependencies = dependency_ids
        .iter()
        .map(|id| task_repo::get_task_by_id(&conn, id).map(|t| NeighbourTask { id: t.id, title: t.title, status: t.status.as_str().to_string() }))
        .collect::<Result<Vec<_>>>()?;

    let dependent_ids = dependency_repo::get_dependents(&conn, &task.id)?;
    let dependents = dependent_ids
        .iter()
        .map(|id| task_repo::get_task_by_id(&conn, id).map(|t| NeighbourTask { id: t.id, title: t.title, status: t.status.as_str().to_string() }))
        .collect::<Result<Vec<_>>>()?;

    let pull_request = pr_repo::get_pr_by_task_id(&conn, &task.id)?;

    Ok(TaskWithNeighbours { task, dependencies, dependents, pull_request, plan })
}

/// `current_task(branch_name)` (spec §4.H) — located by branch, since
/// this implementation carries no session identifier (SPEC_FULL §3).
pub fn current_task(store: &Store, branch_name: &str) -> Result<Option<TaskWithNeighbours>> {
    let conn = store.lock();
    let task = task_repo::get_task_by_branch_name(&conn, branch_name)?;
    drop(conn);
    match task {
        Some(task) => Ok(Some(task_with_neighbours(store, &task.plan_id, &task.id)?)),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Clone)]
pub struct ListTasksFilter {
    pub status: Option<String>,
    pub level: Option<i32>,
}

/// `list_tasks({plan_id, status?, level?})` (spec §4.H).
pub fn list_tasks(store: &Store, plan_id: &str, filter: &ListTasksFilter) -> Result<Vec<Task>> {
    let conn = store.lock();
    let tasks = task_repo::list_tasks_by_plan(&conn, plan_id)?;
    Ok(tasks
        .into_iter()
        .filter(|t| filter.status.as_deref().map_or(true, |s| t.status.as_str() == s))
        .filter(|t| filter.level.map_or(true, |l| t.level == l))
        .collect())
}

/// `list_plans({status?})` (spec §4.H).
pub fn list_plans(store: &Store, project_reference: &str, status: Option<&str>) -> Result<Vec<Plan>> {
    let conn = store.lock();
    let project = project_repo::resolve_project(&conn, project_reference)?;
    let plans = plan_repo::list_plans_by_project(&conn, &project.id)?;
    Ok(plans.into_iter().filter(|p| status.map_or(true, |s| p.status.as_str() == s)).collect())
}
