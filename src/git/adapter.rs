//! Git adapter (spec §4.C): a side-effecting façade over the `git`
//! binary. Every operation fails with a single [`Error::Git`] carrying
//! the command and captured stderr.

use std::path::{Path, PathBuf};

use super::process::{self, LOCAL_TIMEOUT, NETWORK_TIMEOUT};
use crate::error::{Error, Result};

fn run_local(args: &[&str], cwd: &Path) -> Result<process::RunOutput> {
    process::run("git", args, Some(cwd), LOCAL_TIMEOUT)
}

fn run_network(args: &[&str], cwd: &Path) -> Result<process::RunOutput> {
    process::run("git", args, Some(cwd), NETWORK_TIMEOUT)
}

fn require_success(out: process::RunOutput, command: &str) -> Result<process::RunOutput> {
    if out.success {
        Ok(out)
    } else {
        Err(Error::git(command, out.stderr))
    }
}

pub fn is_repo(path: &Path) -> bool {
    run_local(&["rev-parse", "--is-inside-work-tree"], path)
        .map(|out| out.success)
        .unwrap_or(false)
}

pub fn repo_root(path: &Path) -> Result<PathBuf> {
    let out = require_success(run_local(&["rev-parse", "--show-toplevel"], path)?, "rev-parse --show-toplevel")?;
    Ok(PathBuf::from(out.stdout.trim()))
}

/// Resolve any worktree back to the main repository's git directory's
/// parent working tree.
pub fn main_repo_path(path: &Path) -> Result<PathBuf> {
    let out = require_success(
        run_local(&["rev-parse", "--git-common-dir"], path)?,
        "rev-parse --git-common-dir",
    )?;
    let common_dir = PathBuf::from(out.stdout.trim());
    let common_dir = if common_dir.is_relative() { path.join(common_dir) } else { common_dir };
    Ok(common_dir.parent().map(Path::to_path_buf).unwrap_or(common_dir))
}

pub fn branch_exists(path: &Path, name: &str) -> Result<bool> {
    let out = run_local(&["show-ref", "--verify", "--quiet", &format!("refs/heads/{name}")], path)?;
    Ok(out.success)
}

pub fn create_branch(path: &Path, name: &str, base: Option<&str>) -> Result<()> {
    let mut args = vec!["branch", name];
    if let Some(base) = base {
        args.push(base);
    }
    require_success(run_local(&args, path)?, "branch")?;
    Ok(())
}

pub fn checkout_branch(path: &Path, name: &str) -> Result<()> {
    require_success(run_local(&["checkout", name], path)?, "checkout")?;
    Ok(())
}

pub fn current_branch(path: &Path) -> Result<String> {
    let out = require_success(run_local(&["rev-parse", "--abbrev-ref", "HEAD"], path)?, "rev-parse --abbrev-ref HEAD")?;
    Ok(out.stdout.trim().to_string())
}

pub fn add_worktree(repo: &Path, path: &Path, branch: Option<&str>) -> Result<()> {
    let path_str = path.to_string_lossy().to_string();
    let mut args = vec!["worktree", "add"];
    if let Some(branch) = branch {
        args.push("-b");
        args.push(branch);
        args.push(&path_str);
    } else {
        args.push(&path_str);
    }
    require_success(run_local(&args, repo)?, "worktree add")?;
    Ok(())
}

pub fn remove_worktree(repo: &Path, path: &Path) -> Result<()> {
    let path_str = path.to_string_lossy().to_string();
    require_success(run_local(&["worktree", "remove", "--force", &path_str], repo)?, "worktree remove")?;
    Ok(())
}

pub fn list_worktrees(repo: &Path) -> Result<Vec<PathBuf>> {
    let out = require_success(run_local(&["worktree", "list", "--porcelain"], repo)?, "worktree list")?;
    let mut paths = Vec::new();
    for line in out.stdout.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            paths.push(PathBuf::from(path));
        }
    }
    Ok(paths)
}

pub fn prune_worktrees(repo: &Path) -> Result<()> {
    require_success(run_local(&["worktree", "prune"], repo)?, "worktree prune")?;
    Ok(())
}

pub fn remote_url(path: &Path, remote: &str) -> Result<Option<String>> {
    let out = run_local(&["remote", "get-url", remote], path)?;
    if out.success {
        Ok(Some(out.stdout.trim().to_string()))
    } else {
        Ok(None)
    }
}

pub fn push(path: &Path, remote: &str, branch: Option<&str>, set_upstream: bool) -> Result<()> {
    let mut args = vec!["push"];
    if set_upstream {
        args.push("-u");
    }
    args.push(remote);
    if let Some(branch) = branch {
        args.push(branch);
    }
    require_success(run_network(&args, path)?, "push")?;
    Ok(())
}

pub fn fetch(path: &Path) -> Result<()> {
    require_success(run_network(&["fetch"], path)?, "fetch")?;
    Ok(())
}

pub fn pull(path: &Path) -> Result<()> {
    require_success(run_network(&["pull"], path)?, "pull")?;
    Ok(())
}

/// Best-effort: returns "true"/"false" collapsed to a bool; never fails.
pub fn dirty(path: &Path) -> bool {
    run_local(&["status", "--porcelain"], path)
        .map(|out| out.success && !out.stdout.trim().is_empty())
        .unwrap_or(false)
}

/// Best-effort ahead/behind counts against upstream; `"unknown"` on any
/// failure (no upstream configured, detached HEAD, ...) rather than an
/// error, per spec §4.C.
pub fn ahead_behind(path: &Path) -> (String, String) {
    let out = run_local(&["rev-list", "--left-right", "--count", "@{u}...HEAD"], path);
    match out {
        Ok(out) if out.success => {
            let parts: Vec<&str> = out.stdout.trim().split_whitespace().collect();
            if parts.len() == 2 {
                (parts[0].to_string(), parts[1].to_string())
            } else {
                ("unknown".to_string(), "unknown".to_string())
            }
        }
        _ => ("unknown".to_string(), "unknown".to_string()),
    }
}
