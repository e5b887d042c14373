//! `status` command (spec §4.L): the overall plan overview, reusing
//! the same `query::plan_with_progress` projection `plan show` uses.

use crate::cli::context::{self, open_store};
use crate::error::Result;
use crate::output::{json, text};
use crate::query;

pub fn run(plan: &str, project_flag: Option<&str>, json_output: bool) -> i32 {
    let result = run_inner(plan, project_flag, json_output);
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

fn run_inner(plan: &str, project_flag: Option<&str>, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let result = query::plan_with_progress(&store, plan, &project.id)?;

    if json_output {
        println!("{}", json::success(serde_json::to_value(&result).expect("PlanWithProgress serializes")));
    } else {
        text::print_plan(&result.plan);
        println!(
            "Progress: {:.1}% ({}/{} completed, {} in progress, {} pending)",
            result.progress.percent, result.progress.completed, result.progress.total,
            result.progress.in_progress, result.progress.pending
        );
        println!("Tasks:");
        text::print_task_list(&result.tasks);
    }
    Ok(0)
}
