//! Shared CLI plumbing: opening the store and resolving the ambient
//! project (spec §4.L "project resolution").

use crate::config::Config;
use crate::db::connection::Store;
use crate::db::project_repo;
use crate::error::{Error, Result};
use crate::git;
use crate::models::Project;

pub fn open_store() -> Result<Store> {
    let config = Config::load()?;
    config.ensure_dirs()?;
    Store::open(config.db_path)
}

/// Resolve the project an invocation operates on: the explicit
/// `--project` reference if given, otherwise the project whose
/// `repo_root` matches the git repository containing the current
/// working directory.
pub fn resolve_project(store: &Store, project_flag: Option<&str>) -> Result<Project> {
    let conn = store.lock();
    if let Some(reference) = project_flag {
        return project_repo::resolve_project(&conn, reference);
    }

    let cwd = std::env::current_dir()?;
    if !git::is_repo(&cwd) {
        return Err(Error::Invalid(
            "not inside a git repository; pass --project explicitly".into(),
        ));
    }
    let repo_root = git::repo_root(&cwd)?;
    let repo_root_str = path_to_string(&repo_root);

    project_repo::find_project_by_repo_root(&conn, &repo_root_str)?
        .ok_or_else(|| Error::not_found("project", repo_root_str))
}

pub fn path_to_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
