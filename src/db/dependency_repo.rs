//! TaskDependency edges (spec §4.B/E). Column renamed from the teacher's
//! `dependency_id` to `depends_on_id` to match the "task depends on
//! depends_on_id" reading used by [`crate::graph`].

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::TaskDependency;

pub fn add_dependency(conn: &Connection, task_id: &str, depends_on_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO task_deps (task_id, depends_on_id) VALUES (?1, ?2)",
        params![task_id, depends_on_id],
    )?;
    Ok(())
}

pub fn remove_dependency(conn: &Connection, task_id: &str, depends_on_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM task_deps WHERE task_id = ?1 AND depends_on_id = ?2",
        params![task_id, depends_on_id],
    )?;
    Ok(())
}

/// Predecessors of `task_id` — tasks it depends on.
pub fn get_dependencies(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT depends_on_id FROM task_deps WHERE task_id = ?1")?;
    let deps = stmt.query_map(params![task_id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(deps)
}

/// Successors of `depends_on_id` — tasks that depend on this one.
pub fn get_dependents(conn: &Connection, depends_on_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT task_id FROM task_deps WHERE depends_on_id = ?1")?;
    let deps = stmt
        .query_map(params![depends_on_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(deps)
}

/// All edges within a plan, for [`crate::graph::engine`] to validate and
/// schedule over.
pub fn get_all_dependencies_for_plan(conn: &Connection, plan_id: &str) -> Result<Vec<TaskDependency>> {
    let mut stmt = conn.prepare(
        "SELECT td.task_id, td.depends_on_id
         FROM task_deps td
         JOIN tasks t ON td.task_id = t.id
         WHERE t.plan_id = ?1",
    )?;
    let deps = stmt
        .query_map(params![plan_id], |row| {
            Ok(TaskDependency { task_id: row.get(0)?, depends_on_id: row.get(1)? })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(deps)
}

/// True when every dependency of `task_id` is `completed` — the gate
/// `graph::engine::ready_set` and `scheduler::state` evaluate before
/// moving a task from `pending`/`blocked` to `ready`.
pub fn all_dependencies_completed(conn: &Connection, task_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM task_deps td
         JOIN tasks t ON td.depends_on_id = t.id
         WHERE td.task_id = ?1 AND t.status != 'completed'",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(count == 0)
}
