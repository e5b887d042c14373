//! Plan CRUD (spec §4.B). Plans carry no unique name in this data model
//! (unlike the teacher's), so resolution is ID-exact then ID-prefix then
//! title substring.

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{Plan, PlanStatus};

const COLUMNS: &str =
    "id, project_id, title, description, source_branch, status, created_at, updated_at";

pub fn create_plan(
    conn: &Connection,
    id: &str,
    project_id: &str,
    title: &str,
    description: Option<&str>,
    source_branch: &str,
) -> Result<Plan> {
    conn.execute(
        "INSERT INTO plans (id, project_id, title, description, source_branch, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, project_id, title, description, source_branch, PlanStatus::Draft.as_str()],
    )?;
    get_plan_by_id(conn, id)
}

pub fn get_plan_by_id(conn: &Connection, id: &str) -> Result<Plan> {
    conn.query_row(&format!("SELECT {COLUMNS} FROM plans WHERE id = ?1"), params![id], row_to_plan)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found("plan", id),
            other => Error::from(other),
        })
}

pub fn resolve_plan(conn: &Connection, project_id: &str, reference: &str) -> Result<Plan> {
    if let Ok(plan) = get_plan_by_id(conn, reference) {
        if plan.project_id == project_id {
            return Ok(plan);
        }
    }

    let mut stmt =
        conn.prepare(&format!("SELECT {COLUMNS} FROM plans WHERE project_id = ?1 AND id LIKE ?2"))?;
    let prefix = format!("{reference}%");
    let plans: Vec<Plan> = stmt
        .query_map(params![project_id, prefix], row_to_plan)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if plans.len() == 1 {
        return Ok(plans.into_iter().next().unwrap());
    }
    if plans.len() > 1 {
        let candidates = plans.iter().map(|p| format!("{} ({})", p.title, p.id)).collect();
        return Err(Error::ambiguous(reference, candidates));
    }

    let mut stmt =
        conn.prepare(&format!("SELECT {COLUMNS} FROM plans WHERE project_id = ?1 AND title LIKE ?2"))?;
    let pattern = format!("%{reference}%");
    let plans: Vec<Plan> = stmt
        .query_map(params![project_id, pattern], row_to_plan)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    match plans.len() {
        0 => Err(Error::not_found("plan", reference)),
        1 => Ok(plans.into_iter().next().unwrap()),
        _ => {
            let candidates = plans.iter().map(|p| format!("{} ({})", p.title, p.id)).collect();
            Err(Error::ambiguous(reference, candidates))
        }
    }
}

pub fn list_plans_by_project(conn: &Connection, project_id: &str) -> Result<Vec<Plan>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM plans WHERE project_id = ?1 ORDER BY created_at DESC"
    ))?;
    let plans = stmt.query_map(params![project_id], row_to_plan)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(plans)
}

pub fn update_plan_status(conn: &Connection, id: &str, status: PlanStatus) -> Result<()> {
    conn.execute(
        "UPDATE plans SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(())
}

pub fn delete_plan(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM plans WHERE id = ?1", params![id])?;
    Ok(())
}

fn row_to_plan(row: &rusqlite::Row) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        source_branch: row.get(4)?,
        status: PlanStatus::from_str(&row.get::<_, String>(5)?).unwrap_or(PlanStatus::Draft),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
