//! Project CRUD (spec §4.B).

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::Project;

const COLUMNS: &str =
    "id, name, repo_root, remote_url, main_branch, max_concurrency, created_at, updated_at";

#[allow(clippy::too_many_arguments)]
pub fn create_project(
    conn: &Connection,
    id: &str,
    name: &str,
    repo_root: &str,
    remote_url: Option<&str>,
    main_branch: &str,
    max_concurrency: Option<i32>,
) -> Result<Project> {
    conn.execute(
        "INSERT INTO projects (id, name, repo_root, remote_url, main_branch, max_concurrency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, name, repo_root, remote_url, main_branch, max_concurrency],
    )?;
    get_project_by_id(conn, id)
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Project> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        row_to_project,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::not_found("project", id),
        other => Error::from(other),
    })
}

pub fn find_project_by_repo_root(conn: &Connection, repo_root: &str) -> Result<Option<Project>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM projects WHERE repo_root = ?1"))?;
    let mut rows = stmt.query(params![repo_root])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_project(row)?)),
        None => Ok(None),
    }
}

/// Resolve a project by exact ID, then ID prefix, then name substring —
/// the same three-tier resolution the teacher applies to plan names
/// (`resolve_plan`), adapted since a Project is identified by id/name only.
pub fn resolve_project(conn: &Connection, reference: &str) -> Result<Project> {
    if let Ok(project) = get_project_by_id(conn, reference) {
        return Ok(project);
    }

    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM projects WHERE id LIKE ?1"))?;
    let prefix = format!("{reference}%");
    let projects: Vec<Project> = stmt
        .query_map(params![prefix], row_to_project)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if projects.len() == 1 {
        return Ok(projects.into_iter().next().unwrap());
    }
    if projects.len() > 1 {
        let candidates = projects.iter().map(|p| format!("{} ({})", p.name, p.id)).collect();
        return Err(Error::ambiguous(reference, candidates));
    }

    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM projects WHERE name LIKE ?1"))?;
    let pattern = format!("%{reference}%");
    let projects: Vec<Project> = stmt
        .query_map(params![pattern], row_to_project)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    match projects.len() {
        0 => Err(Error::not_found("project", reference)),
        1 => Ok(projects.into_iter().next().unwrap()),
        _ => {
            let candidates = projects.iter().map(|p| format!("{} ({})", p.name, p.id)).collect();
            Err(Error::ambiguous(reference, candidates))
        }
    }
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC"))?;
    let projects = stmt.query_map([], row_to_project)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(projects)
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        repo_root: row.get(2)?,
        remote_url: row.get(3)?,
        main_branch: row.get(4)?,
        max_concurrency: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
