//! `pr` subcommand handlers (spec §4.D, §4.L): open/refresh/list pull
//! requests via `forge::adapter`, keeping the task/PR rows in sync
//! through `scheduler::mark_pr_created` and `state_machine::pr_transition`.

use crate::cli::commands::PrCommands;
use crate::cli::context::{self, open_store};
use crate::db::{plan_repo, pr_repo, task_repo};
use crate::error::{Error, Result};
use crate::forge;
use crate::id::IdGenerator;
use crate::models::PullRequestStatus;
use crate::output::{json, text};
use crate::scheduler;

pub fn run(cmd: PrCommands, project_flag: Option<&str>, json_output: bool) -> i32 {
    let result = match cmd {
        PrCommands::Create { plan, task, body, draft } => {
            run_create(project_flag, &plan, &task, body.as_deref(), draft, json_output)
        }
        PrCommands::Sync { plan, task } => run_sync(project_flag, &plan, &task, json_output),
        PrCommands::List { plan } => run_list(project_flag, &plan, json_output),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!("{}", json::error(&e));
            } else {
                eprintln!("Error: {e}");
            }
            e.code().exit_code()
        }
    }
}

fn run_create(
    project_flag: Option<&str>,
    plan: &str,
    task: &str,
    body: Option<&str>,
    draft: bool,
    json_output: bool,
) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;

    let task = {
        let conn = store.lock();
        let plan = plan_repo::resolve_plan(&conn, &project.id, plan)?;
        task_repo::resolve_task(&conn, &plan.id, task)?
    };

    let branch_name = task
        .branch_name
        .as_deref()
        .ok_or_else(|| Error::Invalid(format!("task {} has no branch; it has not been assigned yet", task.id)))?;

    let repo_root = std::path::PathBuf::from(&project.repo_root);
    let forge_pr = forge::create_pr(
        &repo_root,
        forge::CreatePrOptions {
            title: &task.title,
            body: body.unwrap_or_default(),
            base: &project.main_branch,
            head: branch_name,
            draft,
        },
    )?;

    let ids = IdGenerator::new();
    let pr = {
        let conn = store.lock();
        pr_repo::create_pr(&conn, &ids.next(), &task.id, forge_pr.number, &forge_pr.url, &project.main_branch, branch_name)?
    };

    scheduler::mark_pr_created(&store, &task.id)?;

    if json_output {
        println!("{}", json::success(json::pr_json(&pr)));
    } else {
        text::print_pr(&pr);
    }
    Ok(0)
}

fn run_sync(project_flag: Option<&str>, plan: &str, task: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;

    let task = {
        let conn = store.lock();
        let plan = plan_repo::resolve_plan(&conn, &project.id, plan)?;
        task_repo::resolve_task(&conn, &plan.id, task)?
    };

    let pr = {
        let conn = store.lock();
        pr_repo::get_pr_by_task_id(&conn, &task.id)?
            .ok_or_else(|| Error::not_found("pull_request", format!("for task {}", task.id)))?
    };

    let repo_root = std::path::PathBuf::from(&project.repo_root);
    let forge_pr = forge::get_pr(&repo_root, pr.number)?;

    let updated = store.transaction(|conn| {
        if forge_pr.status != pr.status {
            crate::state_machine::pr_transition(pr.status, forge_pr.status)?;
            pr_repo::update_pr_status(conn, &pr.id, forge_pr.status)?;
        }
        pr_repo::get_pr_by_id(conn, &pr.id)
    })?;

    if updated.status == PullRequestStatus::InReview {
        let _ = store.transaction(|conn| {
            let current = task_repo::get_task_by_id(conn, &task.id)?;
            if current.status == crate::models::TaskStatus::PrCreated {
                crate::state_machine::task_transition(current.status, crate::models::TaskStatus::InReview)?;
                task_repo::update_task_status(conn, &task.id, crate::models::TaskStatus::InReview)?;
            }
            Ok(())
        });
    } else if updated.status == PullRequestStatus::Merged {
        let current = {
            let conn = store.lock();
            task_repo::get_task_by_id(&conn, &task.id)?
        };
        if current.status != crate::models::TaskStatus::Completed {
            if current.status != crate::models::TaskStatus::InReview {
                let _ = store.transaction(|conn| {
                    crate::state_machine::task_transition(current.status, crate::models::TaskStatus::InReview)?;
                    task_repo::update_task_status(conn, &task.id, crate::models::TaskStatus::InReview)
                });
            }
            scheduler::complete(&store, &task.id, false)?;
            scheduler::update_plan_progress(&store, &task.plan_id)?;
        }
    }

    if json_output {
        println!("{}", json::success(json::pr_json(&updated)));
    } else {
        text::print_pr(&updated);
    }
    Ok(0)
}

fn run_list(project_flag: Option<&str>, plan: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let plan_id = {
        let conn = store.lock();
        plan_repo::resolve_plan(&conn, &project.id, plan)?.id
    };

    let prs = {
        let conn = store.lock();
        pr_repo::list_prs_by_plan(&conn, &plan_id)?
    };

    if json_output {
        let items: Vec<_> = prs.iter().map(json::pr_json).collect();
        println!("{}", json::success(serde_json::Value::Array(items)));
    } else {
        text::print_pr_list(&prs);
    }
    Ok(0)
}
