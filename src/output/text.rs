//! Human-readable renderers, the non-`--json` counterpart of
//! `output::json`. Kept deliberately plain (spec §1 scopes terminal
//! colouring/spinners out).

use crate::db::task_repo::TaskProgress;
use crate::models::{Plan, Project, PullRequest, Slot, Task};

pub fn print_project(p: &Project) {
    println!("Project: {} ({})", p.name, p.id);
    println!("  Repo root: {}", p.repo_root);
    if let Some(ref url) = p.remote_url {
        println!("  Remote: {url}");
    }
    println!("  Main branch: {}", p.main_branch);
    if let Some(max) = p.max_concurrency {
        println!("  Max concurrency: {max}");
    }
}

pub fn print_project_list(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }
    for p in projects {
        println!("  {} ({}) - {}", p.name, &p.id[..p.id.len().min(8)], p.repo_root);
    }
}

pub fn print_plan(p: &Plan) {
    println!("Plan: {} ({})", p.title, p.id);
    if let Some(ref desc) = p.description {
        println!("  Description: {desc}");
    }
    println!("  Status: {}", p.status.as_str());
    println!("  Source branch: {}", p.source_branch);
    println!("  Created: {}", p.created_at);
}

pub fn print_plan_list(plans: &[Plan]) {
    if plans.is_empty() {
        println!("No plans found.");
        return;
    }
    for p in plans {
        println!("  {} ({}) [{}]", p.title, &p.id[..p.id.len().min(8)], p.status.as_str());
    }
}

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    println!("  Status: {}", t.status.as_str());
    println!("  Level: {}", t.level);
    if let Some(lines) = t.estimated_lines {
        println!("  Estimated lines: {lines}");
    }
    if let Some(ref branch) = t.branch_name {
        println!("  Branch: {branch}");
    }
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        println!(
            "  [{}] L{} {} ({})",
            t.status.as_str(),
            t.level,
            t.title,
            &t.id[..t.id.len().min(8)]
        );
    }
}

pub fn print_slot_list(slots: &[Slot]) {
    if slots.is_empty() {
        println!("No slots found.");
        return;
    }
    for s in slots {
        let task = s.task_id.as_deref().unwrap_or("-");
        println!("  {} [{}] {} (task: {task})", s.name, s.status.as_str(), s.path);
    }
}

pub fn print_pr(p: &PullRequest) {
    println!("PR #{} [{}] {}", p.number, p.status.as_str(), p.url);
    println!("  {} -> {}", p.head_branch, p.base_branch);
}

pub fn print_pr_list(prs: &[PullRequest]) {
    if prs.is_empty() {
        println!("No pull requests found.");
        return;
    }
    for p in prs {
        println!("  #{} [{}] {}", p.number, p.status.as_str(), p.url);
    }
}

pub fn print_progress(p: &TaskProgress) {
    println!("Progress: {:.1}% ({}/{})", p.percentage, p.completed, p.total);
    println!(
        "  pending={} ready={} assigned={} in_progress={} pr_created={} in_review={} completed={} blocked={}",
        p.pending, p.ready, p.assigned, p.in_progress, p.pr_created, p.in_review, p.completed, p.blocked
    );
}
