//! Slot CRUD (spec §3/§4.F). Slots are the fixed-size worktree pool the
//! scheduler assigns tasks onto and releases back when a task completes.

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{Slot, SlotStatus};

const COLUMNS: &str = "id, project_id, name, path, branch, status, task_id, created_at, updated_at";

pub fn create_slot(conn: &Connection, id: &str, project_id: &str, name: &str, path: &str) -> Result<Slot> {
    conn.execute(
        "INSERT INTO slots (id, project_id, name, path, status) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, project_id, name, path, SlotStatus::Available.as_str()],
    )?;
    get_slot_by_id(conn, id)
}

pub fn get_slot_by_id(conn: &Connection, id: &str) -> Result<Slot> {
    conn.query_row(&format!("SELECT {COLUMNS} FROM slots WHERE id = ?1"), params![id], row_to_slot)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found("slot", id),
            other => Error::from(other),
        })
}

pub fn list_slots_by_project(conn: &Connection, project_id: &str) -> Result<Vec<Slot>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM slots WHERE project_id = ?1 ORDER BY name ASC"))?;
    let slots = stmt.query_map(params![project_id], row_to_slot)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(slots)
}

/// First available slot for a project, ordered by name for deterministic
/// reuse (the same slot tends to get picked first run after run).
pub fn next_available_slot(conn: &Connection, project_id: &str) -> Result<Option<Slot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM slots WHERE project_id = ?1 AND status = 'available' ORDER BY name ASC LIMIT 1"
    ))?;
    let mut rows = stmt.query(params![project_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_slot(row)?)),
        None => Ok(None),
    }
}

pub fn count_slots(conn: &Connection, project_id: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM slots WHERE project_id = ?1",
        params![project_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn bind_slot(conn: &Connection, id: &str, status: SlotStatus, branch: &str, task_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE slots SET status = ?1, branch = ?2, task_id = ?3, updated_at = datetime('now') WHERE id = ?4",
        params![status.as_str(), branch, task_id, id],
    )?;
    Ok(())
}

pub fn update_slot_status(conn: &Connection, id: &str, status: SlotStatus) -> Result<()> {
    conn.execute(
        "UPDATE slots SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(())
}

/// Return a slot to the pool — clears its branch/task binding so the next
/// `next_available_slot` call can reuse it.
pub fn release_slot(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE slots SET status = ?1, branch = NULL, task_id = NULL, updated_at = datetime('now') WHERE id = ?2",
        params![SlotStatus::Available.as_str(), id],
    )?;
    Ok(())
}

fn row_to_slot(row: &rusqlite::Row) -> rusqlite::Result<Slot> {
    Ok(Slot {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        path: row.get(3)?,
        branch: row.get(4)?,
        status: SlotStatus::from_str(&row.get::<_, String>(5)?).unwrap_or(SlotStatus::Error),
        task_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
