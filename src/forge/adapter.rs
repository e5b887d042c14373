//! Forge adapter (spec §4.D): wraps the `gh` CLI the same way
//! [`crate::git::adapter`] wraps `git`, via the shared
//! [`crate::git::process::run`] subprocess helper.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::git::process;
use crate::models::PullRequestStatus;

const FORGE_TIMEOUT: Duration = Duration::from_secs(60);
const JSON_FIELDS: &str = "number,title,url,state,headRefName,baseRefName,isDraft,reviewDecision";

fn run(args: &[&str], cwd: &Path) -> Result<process::RunOutput> {
    process::run("gh", args, Some(cwd), FORGE_TIMEOUT)
}

fn require_success(out: process::RunOutput, command: &str) -> Result<process::RunOutput> {
    if out.success {
        Ok(out)
    } else {
        Err(Error::forge(command, out.stderr))
    }
}

#[derive(Debug, Deserialize)]
struct RawPr {
    number: i64,
    #[allow(dead_code)]
    title: String,
    url: String,
    state: String,
    #[serde(rename = "headRefName")]
    head_ref_name: String,
    #[serde(rename = "baseRefName")]
    base_ref_name: String,
    #[serde(rename = "isDraft")]
    is_draft: bool,
    #[serde(rename = "reviewDecision")]
    review_decision: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForgePr {
    pub number: i64,
    pub url: String,
    pub head_branch: String,
    pub base_branch: String,
    pub status: PullRequestStatus,
}

/// Status translation table (spec §4.D, mandatory and exact).
fn translate_status(raw: &RawPr) -> PullRequestStatus {
    if raw.state.eq_ignore_ascii_case("MERGED") {
        return PullRequestStatus::Merged;
    }
    if raw.state.eq_ignore_ascii_case("CLOSED") {
        return PullRequestStatus::Closed;
    }
    if raw.is_draft {
        return PullRequestStatus::Draft;
    }
    match raw.review_decision.as_deref() {
        Some("APPROVED") => PullRequestStatus::Approved,
        Some("CHANGES_REQUESTED") => PullRequestStatus::InReview,
        _ if raw.state.eq_ignore_ascii_case("OPEN") => PullRequestStatus::Open,
        _ => PullRequestStatus::Draft,
    }
}

fn from_raw(raw: RawPr) -> ForgePr {
    let status = translate_status(&raw);
    ForgePr {
        number: raw.number,
        url: raw.url,
        head_branch: raw.head_ref_name,
        base_branch: raw.base_ref_name,
        status,
    }
}

pub fn availability_check(path: &Path) -> bool {
    run(&["auth", "status"], path).map(|out| out.success).unwrap_or(false)
}

pub struct CreatePrOptions<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub base: &'a str,
    pub head: &'a str,
    pub draft: bool,
}

pub fn create_pr(path: &Path, opts: CreatePrOptions<'_>) -> Result<ForgePr> {
    let mut args = vec!["pr", "create", "--title", opts.title, "--body", opts.body, "--base", opts.base, "--head", opts.head];
    if opts.draft {
        args.push("--draft");
    }
    require_success(run(&args, path)?, "pr create")?;
    // `gh pr create` prints the PR URL, not JSON; look it up to get the
    // full shape back (also picks up the forge-assigned number).
    get_pr_by_branch(path, opts.head)?.ok_or_else(|| Error::forge("pr create", "PR not found after creation"))
}

pub fn get_pr(path: &Path, number: i64) -> Result<ForgePr> {
    let number_str = number.to_string();
    let out = require_success(
        run(&["pr", "view", &number_str, "--json", JSON_FIELDS], path)?,
        "pr view",
    )?;
    let raw: RawPr = serde_json::from_str(&out.stdout).map_err(|e| Error::forge("pr view", e.to_string()))?;
    Ok(from_raw(raw))
}

fn get_pr_by_branch(path: &Path, branch: &str) -> Result<Option<ForgePr>> {
    let out = run(&["pr", "view", branch, "--json", JSON_FIELDS], path)?;
    if !out.success {
        return Ok(None);
    }
    let raw: RawPr = serde_json::from_str(&out.stdout).map_err(|e| Error::forge("pr view", e.to_string()))?;
    Ok(Some(from_raw(raw)))
}

pub fn list_prs(path: &Path, state: &str) -> Result<Vec<ForgePr>> {
    let out = require_success(
        run(&["pr", "list", "--state", state, "--json", JSON_FIELDS], path)?,
        "pr list",
    )?;
    let raws: Vec<RawPr> = serde_json::from_str(&out.stdout).map_err(|e| Error::forge("pr list", e.to_string()))?;
    Ok(raws.into_iter().map(from_raw).collect())
}

#[derive(Debug, Clone, Copy)]
pub enum MergeStrategy {
    Merge,
    Squash,
    Rebase,
}

pub fn merge_pr(path: &Path, number: i64, strategy: MergeStrategy, delete_branch: bool) -> Result<()> {
    let number_str = number.to_string();
    let mut args = vec!["pr", "merge", &number_str];
    args.push(match strategy {
        MergeStrategy::Merge => "--merge",
        MergeStrategy::Squash => "--squash",
        MergeStrategy::Rebase => "--rebase",
    });
    if delete_branch {
        args.push("--delete-branch");
    }
    require_success(run(&args, path)?, "pr merge")?;
    Ok(())
}

pub fn close_pr(path: &Path, number: i64) -> Result<()> {
    let number_str = number.to_string();
    require_success(run(&["pr", "close", &number_str], path)?, "pr close")?;
    Ok(())
}

pub fn mark_ready(path: &Path, number: i64) -> Result<()> {
    let number_str = number.to_string();
    require_success(run(&["pr", "ready", &number_str], path)?, "pr ready")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(state: &str, draft: bool, review: Option<&str>) -> RawPr {
        RawPr {
            number: 1,
            title: "t".into(),
            url: "https://example.com/1".into(),
            state: state.into(),
            head_ref_name: "feature/x".into(),
            base_ref_name: "main".into(),
            is_draft: draft,
            review_decision: review.map(String::from),
        }
    }

    #[test]
    fn merged_wins_over_everything() {
        assert_eq!(translate_status(&raw("MERGED", true, Some("APPROVED"))), PullRequestStatus::Merged);
    }

    #[test]
    fn draft_flag_takes_precedence_over_open() {
        assert_eq!(translate_status(&raw("OPEN", true, None)), PullRequestStatus::Draft);
    }

    #[test]
    fn review_decision_maps_when_not_draft() {
        assert_eq!(translate_status(&raw("OPEN", false, Some("APPROVED"))), PullRequestStatus::Approved);
        assert_eq!(translate_status(&raw("OPEN", false, Some("CHANGES_REQUESTED"))), PullRequestStatus::InReview);
    }

    #[test]
    fn plain_open_maps_to_open() {
        assert_eq!(translate_status(&raw("OPEN", false, None)), PullRequestStatus::Open);
    }
}
