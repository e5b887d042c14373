//! PullRequest CRUD (spec §4.D): one row per task, created once a forge
//! PR is opened and updated as the forge-side status changes.

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{PullRequest, PullRequestStatus};

const COLUMNS: &str = "id, task_id, number, url, status, base_branch, head_branch, created_at, updated_at";

#[allow(clippy::too_many_arguments)]
pub fn create_pr(
    conn: &Connection,
    id: &str,
    task_id: &str,
    number: i64,
    url: &str,
    base_branch: &str,
    head_branch: &str,
) -> Result<PullRequest> {
    conn.execute(
        "INSERT INTO prs (id, task_id, number, url, status, base_branch, head_branch)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, task_id, number, url, PullRequestStatus::Open.as_str(), base_branch, head_branch],
    )?;
    get_pr_by_id(conn, id)
}

pub fn get_pr_by_id(conn: &Connection, id: &str) -> Result<PullRequest> {
    conn.query_row(&format!("SELECT {COLUMNS} FROM prs WHERE id = ?1"), params![id], row_to_pr)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found("pull_request", id),
            other => Error::from(other),
        })
}

pub fn get_pr_by_task_id(conn: &Connection, task_id: &str) -> Result<Option<PullRequest>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM prs WHERE task_id = ?1"))?;
    let mut rows = stmt.query(params![task_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_pr(row)?)),
        None => Ok(None),
    }
}

pub fn update_pr_status(conn: &Connection, id: &str, status: PullRequestStatus) -> Result<()> {
    conn.execute(
        "UPDATE prs SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(())
}

pub fn list_prs_by_plan(conn: &Connection, plan_id: &str) -> Result<Vec<PullRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM prs p JOIN tasks t ON p.task_id = t.id
         WHERE t.plan_id = ?1 ORDER BY p.created_at ASC"
    ))?;
    let prs = stmt.query_map(params![plan_id], row_to_pr)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(prs)
}

fn row_to_pr(row: &rusqlite::Row) -> rusqlite::Result<PullRequest> {
    Ok(PullRequest {
        id: row.get(0)?,
        task_id: row.get(1)?,
        number: row.get(2)?,
        url: row.get(3)?,
        status: PullRequestStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(PullRequestStatus::Open),
        base_branch: row.get(5)?,
        head_branch: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
