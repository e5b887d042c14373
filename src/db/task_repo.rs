//! Task CRUD (spec §4.B), including the `branch_name`-keyed lookup the
//! assign flow needs to detect a branch already owned by another task
//! (§9 open question resolution in SPEC_FULL.md §4.F).

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{Task, TaskStatus};

const COLUMNS: &str = "id, plan_id, title, description, status, level, estimated_lines, \
                       branch_name, slot_id, created_at, updated_at";

pub fn create_task(
    conn: &Connection,
    id: &str,
    plan_id: &str,
    title: &str,
    description: Option<&str>,
    level: i32,
    estimated_lines: Option<i32>,
) -> Result<Task> {
    conn.execute(
        "INSERT INTO tasks (id, plan_id, title, description, status, level, estimated_lines)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, plan_id, title, description, TaskStatus::Pending.as_str(), level, estimated_lines],
    )?;
    get_task_by_id(conn, id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task> {
    conn.query_row(&format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"), params![id], row_to_task)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found("task", id),
            other => Error::from(other),
        })
}

pub fn get_task_by_branch_name(conn: &Connection, branch_name: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM tasks WHERE branch_name = ?1"))?;
    let mut rows = stmt.query(params![branch_name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_task(row)?)),
        None => Ok(None),
    }
}

pub fn resolve_task(conn: &Connection, plan_id: &str, reference: &str) -> Result<Task> {
    if let Ok(task) = get_task_by_id(conn, reference) {
        if task.plan_id == plan_id {
            return Ok(task);
        }
    }

    let mut stmt =
        conn.prepare(&format!("SELECT {COLUMNS} FROM tasks WHERE plan_id = ?1 AND id LIKE ?2"))?;
    let prefix = format!("{reference}%");
    let tasks: Vec<Task> = stmt
        .query_map(params![plan_id, prefix], row_to_task)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    match tasks.len() {
        0 => Err(Error::not_found("task", reference)),
        1 => Ok(tasks.into_iter().next().unwrap()),
        _ => {
            let candidates = tasks.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
            Err(Error::ambiguous(reference, candidates))
        }
    }
}

pub fn list_tasks_by_plan(conn: &Connection, plan_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE plan_id = ?1 ORDER BY level ASC, created_at ASC"
    ))?;
    let tasks = stmt.query_map(params![plan_id], row_to_task)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Tasks in `ready` status for a plan, ordered for deterministic scheduling
/// (lowest DAG level first, then insertion order).
pub fn ready_tasks(conn: &Connection, plan_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE plan_id = ?1 AND status = 'ready' ORDER BY level ASC, created_at ASC"
    ))?;
    let tasks = stmt.query_map(params![plan_id], row_to_task)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Tasks currently occupying a slot (spec §4.F's "in_progress set":
/// assigned/in_progress/pr_created/in_review).
pub fn active_tasks(conn: &Connection, plan_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE plan_id = ?1 \
         AND status IN ('assigned', 'in_progress', 'pr_created', 'in_review') \
         ORDER BY updated_at ASC"
    ))?;
    let tasks = stmt.query_map(params![plan_id], row_to_task)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

pub fn update_task_status(conn: &Connection, id: &str, status: TaskStatus) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(())
}

pub fn assign_task(
    conn: &Connection,
    id: &str,
    status: TaskStatus,
    branch_name: &str,
    slot_id: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET status = ?1, branch_name = ?2, slot_id = ?3, updated_at = datetime('now')
         WHERE id = ?4",
        params![status.as_str(), branch_name, slot_id, id],
    )?;
    Ok(())
}

/// Release the slot binding (used on completion, the slot returns to the
/// pool while the task's `branch_name` is preserved for the record).
pub fn release_slot(conn: &Connection, id: &str, status: TaskStatus) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET status = ?1, slot_id = NULL, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(())
}

/// Status counts for a plan, grounding `query::plan_with_progress` (spec §4.H).
pub fn task_progress(conn: &Connection, plan_id: &str) -> Result<TaskProgress> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks WHERE plan_id = ?1 GROUP BY status")?;
    let mut progress = TaskProgress::default();
    let rows = stmt.query_map(params![plan_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (status, count) = row?;
        match status.as_str() {
            "pending" => progress.pending = count,
            "ready" => progress.ready = count,
            "assigned" => progress.assigned = count,
            "in_progress" => progress.in_progress = count,
            "pr_created" => progress.pr_created = count,
            "in_review" => progress.in_review = count,
            "completed" => progress.completed = count,
            "blocked" => progress.blocked = count,
            _ => {}
        }
    }
    progress.total = progress.pending
        + progress.ready
        + progress.assigned
        + progress.in_progress
        + progress.pr_created
        + progress.in_review
        + progress.completed
        + progress.blocked;
    progress.percentage = if progress.total > 0 {
        (progress.completed as f64 / progress.total as f64) * 100.0
    } else {
        0.0
    };
    Ok(progress)
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct TaskProgress {
    pub total: i64,
    pub pending: i64,
    pub ready: i64,
    pub assigned: i64,
    pub in_progress: i64,
    pub pr_created: i64,
    pub in_review: i64,
    pub completed: i64,
    pub blocked: i64,
    pub percentage: f64,
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(TaskStatus::Blocked),
        level: row.get(5)?,
        estimated_lines: row.get(6)?,
        branch_name: row.get(7)?,
        slot_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
