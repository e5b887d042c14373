//! `task` subcommand handlers (spec §4.L). Read-only handlers delegate
//! to `query::`; mutating handlers delegate to `scheduler::` and
//! `state_machine::` rather than writing status columns directly.

use crate::cli::commands::TaskCommands;
use crate::cli::context::{self, open_store};
use crate::error::Result;
use crate::output::{json, text};
use crate::query::{self, ListTasksFilter};
use crate::scheduler;

pub fn run(cmd: TaskCommands, project_flag: Option<&str>, json_output: bool) -> i32 {
    let result = match cmd {
        TaskCommands::List { plan, status, level } => run_list(project_flag, &plan, status, level, json_output),
        TaskCommands::Show { plan, task } => run_show(project_flag, &plan, &task, json_output),
        TaskCommands::Start { plan, task } => run_start(project_flag, &plan, &task, json_output),
        TaskCommands::Complete { plan, task, force } => run_complete(project_flag, &plan, &task, force, json_output),
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

fn run_list(
    project_flag: Option<&str>,
    plan: &str,
    status: Option<String>,
    level: Option<i32>,
    json_output: bool,
) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let plan = {
        let conn = store.lock();
        crate::db::plan_repo::resolve_plan(&conn, &project.id, plan)?
    };

    let filter = ListTasksFilter { status, level };
    let tasks = query::list_tasks(&store, &plan.id, &filter)?;

    if json_output {
        let items: Vec<_> = tasks.iter().map(json::task_json).collect();
        println!("{}", json::success(serde_json::Value::Array(items)));
    } else {
        text::print_task_list(&tasks);
    }
    Ok(0)
}

fn run_show(project_flag: Option<&str>, plan: &str, task: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let plan = {
        let conn = store.lock();
        crate::db::plan_repo::resolve_plan(&conn, &project.id, plan)?
    };

    let result = query::task_with_neighbours(&store, &plan.id, task)?;

    if json_output {
        println!("{}", json::success(serde_json::to_value(&result).expect("TaskWithNeighbours serializes")));
    } else {
        text::print_task(&result.task);
        if !result.dependencies.is_empty() {
            println!("Dependencies:");
            for d in &result.dependencies {
                println!("  [{}] {} ({})", d.status, d.title, d.id);
            }
        }
        if !result.dependents.is_empty() {
            println!("Dependents:");
            for d in &result.dependents {
                println!("  [{}] {} ({})", d.status, d.title, d.id);
            }
        }
        if let Some(pr) = &result.pull_request {
            text::print_pr(pr);
        }
    }
    Ok(0)
}

fn run_start(project_flag: Option<&str>, plan: &str, task: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let task_id = {
        let conn = store.lock();
        let plan = crate::db::plan_repo::resolve_plan(&conn, &project.id, plan)?;
        crate::db::task_repo::resolve_task(&conn, &plan.id, task)?.id
    };

    scheduler::start(&store, &task_id)?;

    let updated = {
        let conn = store.lock();
        crate::db::task_repo::get_task_by_id(&conn, &task_id)?
    };

    if json_output {
        println!("{}", json::success(json::task_json(&updated)));
    } else {
        text::print_task(&updated);
    }
    Ok(0)
}

fn run_complete(project_flag: Option<&str>, plan: &str, task: &str, force: bool, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let (plan_id, task_id) = {
        let conn = store.lock();
        let plan = crate::db::plan_repo::resolve_plan(&conn, &project.id, plan)?;
        let task = crate::db::task_repo::resolve_task(&conn, &plan.id, task)?;
        (plan.id, task.id)
    };

    scheduler::complete(&store, &task_id, force)?;
    scheduler::update_plan_progress(&store, &plan_id)?;

    let updated = {
        let conn = store.lock();
        crate::db::task_repo::get_task_by_id(&conn, &task_id)?
    };

    if json_output {
        println!("{}", json::success(json::task_json(&updated)));
    } else {
        text::print_task(&updated);
    }
    Ok(0)
}
