//! `schedule` subcommand handlers (spec §4.F, §4.L): drives
//! `SchedulerState::initialise` -> `next_batch` -> `assign`.

use crate::cli::commands::ScheduleCommands;
use crate::cli::context::{self, open_store};
use crate::error::Result;
use crate::output::json;
use crate::scheduler::{self, SchedulerState};

pub fn run(cmd: ScheduleCommands, project_flag: Option<&str>, json_output: bool) -> i32 {
    let result = match cmd {
        ScheduleCommands::Run { plan, max_concurrent, dry_run } => {
            run_schedule(project_flag, &plan, max_concurrent, dry_run, json_output)
        }
        ScheduleCommands::Status { plan } => run_status(project_flag, &plan, json_output),
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

fn run_schedule(
    project_flag: Option<&str>,
    plan: &str,
    max_concurrent: Option<usize>,
    dry_run: bool,
    json_output: bool,
) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;

    let plan_id = {
        let conn = store.lock();
        crate::db::plan_repo::resolve_plan(&conn, &project.id, plan)?.id
    };

    let state = {
        let conn = store.lock();
        SchedulerState::initialise(&conn, &plan_id)?
    };

    let max_concurrent = max_concurrent
        .or_else(|| project.max_concurrency.map(|n| n as usize))
        .unwrap_or(4);

    let batch = {
        let conn = store.lock();
        scheduler::next_batch(&conn, &state, &project.id, max_concurrent)?
    };

    if !dry_run {
        scheduler::assign(&store, &project.main_branch, &batch, &scheduler::Cancel::new())?;
    }

    if json_output {
        let items: Vec<_> = batch
            .iter()
            .map(|b| serde_json::json!({ "task_id": b.task_id, "slot_id": b.slot_id, "branch_name": b.branch_name }))
            .collect();
        println!("{}", json::success(serde_json::json!({ "assigned": !dry_run, "batch": items })));
    } else if batch.is_empty() {
        println!("No ready tasks to schedule.");
    } else {
        for pairing in &batch {
            println!("  {} -> slot {} (branch {})", pairing.task_id, pairing.slot_id, pairing.branch_name);
        }
        if dry_run {
            println!("(dry run: not assigned)");
        }
    }
    Ok(0)
}

fn run_status(project_flag: Option<&str>, plan: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let plan_id = {
        let conn = store.lock();
        crate::db::plan_repo::resolve_plan(&conn, &project.id, plan)?.id
    };

    let progress = {
        let conn = store.lock();
        SchedulerState::initialise(&conn, &plan_id)?.progress()
    };

    if json_output {
        println!("{}", json::success(json::scheduler_progress_json(&progress)));
    } else {
        println!(
            "total={} completed={} in_progress={} pending={}",
            progress.total, progress.completed, progress.in_progress, progress.pending
        );
    }
    Ok(0)
}
