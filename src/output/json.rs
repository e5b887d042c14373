//! JSON envelopes and per-entity renderers shared by the CLI (spec §4.L)
//! and reused, where it overlaps with the query surface, by `cli::*`'s
//! `--json` mode. Shaped after the teacher's `output::json`: a `success`/
//! `error` envelope plus one small `*_json` function per entity.

use serde_json::{json, Value};

use crate::db::task_repo::TaskProgress;
use crate::error::Error;
use crate::models::{Plan, Project, PullRequest, Slot, Task};
use crate::scheduler::SchedulerProgress;

pub fn success(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

pub fn error(err: &Error) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code().as_str(),
            "message": err.to_string()
        }
    })
}

pub fn project_json(p: &Project) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "repo_root": p.repo_root,
        "remote_url": p.remote_url,
        "main_branch": p.main_branch,
        "max_concurrency": p.max_concurrency,
        "created_at": p.created_at,
        "updated_at": p.updated_at
    })
}

pub fn plan_json(p: &Plan) -> Value {
    json!({
        "id": p.id,
        "project_id": p.project_id,
        "title": p.title,
        "description": p.description,
        "source_branch": p.source_branch,
        "status": p.status.as_str(),
        "created_at": p.created_at,
        "updated_at": p.updated_at
    })
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "plan_id": t.plan_id,
        "title": t.title,
        "description": t.description,
        "status": t.status.as_str(),
        "level": t.level,
        "estimated_lines": t.estimated_lines,
        "branch_name": t.branch_name,
        "slot_id": t.slot_id,
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn slot_json(s: &Slot) -> Value {
    json!({
        "id": s.id,
        "project_id": s.project_id,
        "name": s.name,
        "path": s.path,
        "branch": s.branch,
        "status": s.status.as_str(),
        "task_id": s.task_id,
        "created_at": s.created_at,
        "updated_at": s.updated_at
    })
}

pub fn pr_json(p: &PullRequest) -> Value {
    json!({
        "id": p.id,
        "task_id": p.task_id,
        "number": p.number,
        "url": p.url,
        "status": p.status.as_str(),
        "base_branch": p.base_branch,
        "head_branch": p.head_branch,
        "created_at": p.created_at,
        "updated_at": p.updated_at
    })
}

pub fn progress_json(p: &TaskProgress) -> Value {
    json!({
        "total": p.total,
        "pending": p.pending,
        "ready": p.ready,
        "assigned": p.assigned,
        "in_progress": p.in_progress,
        "pr_created": p.pr_created,
        "in_review": p.in_review,
        "completed": p.completed,
        "blocked": p.blocked,
        "percentage": (p.percentage * 10.0).round() / 10.0
    })
}

pub fn scheduler_progress_json(p: &SchedulerProgress) -> Value {
    json!({
        "total": p.total,
        "completed": p.completed,
        "in_progress": p.in_progress,
        "pending": p.pending
    })
}
