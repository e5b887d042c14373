//! `plan` subcommand handlers (spec §4.G, §4.L). `generate` is the
//! two-phase persistence flow spelled out in §4.G: the draft -> planning
//! transition is committed before the external planner call; the
//! persisted tasks/edges plus planning -> ready move as a second,
//! separate transaction. A failure in the second phase restores the
//! plan to draft explicitly, since the two transactions don't share a
//! rollback.

use crate::cli::commands::PlanCommands;
use crate::cli::context::{self, open_store};
use crate::db::{dependency_repo, plan_repo, task_repo};
use crate::error::Result;
use crate::graph::{Edge, Graph};
use crate::id::IdGenerator;
use crate::models::PlanStatus;
use crate::output::{json, text};
use crate::planner::{AnthropicPlanner, Planner, PlannerInput};
use crate::query;

pub fn run(cmd: PlanCommands, project_flag: Option<&str>, json_output: bool) -> i32 {
    let result = match cmd {
        PlanCommands::Create { title, description } => run_create(project_flag, &title, description.as_deref(), json_output),
        PlanCommands::List { status } => run_list(project_flag, status.as_deref(), json_output),
        PlanCommands::Show { reference } => run_show(project_flag, &reference, json_output),
        PlanCommands::Generate { reference, prompt, max_lines_per_task } => {
            run_generate(project_flag, &reference, &prompt, max_lines_per_task, json_output)
        }
        PlanCommands::Archive { reference } => run_archive(project_flag, &reference, json_output),
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

fn run_create(project_flag: Option<&str>, title: &str, description: Option<&str>, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let ids = IdGenerator::new();

    let conn = store.lock();
    let plan = plan_repo::create_plan(&conn, &ids.next(), &project.id, title, description, &project.main_branch)?;
    drop(conn);

    if json_output {
        println!("{}", json::success(json::plan_json(&plan)));
    } else {
        text::print_plan(&plan);
    }
    Ok(0)
}

fn run_list(project_flag: Option<&str>, status: Option<&str>, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let plans = query::list_plans(&store, &project.id, status)?;

    if json_output {
        let items: Vec<_> = plans.iter().map(json::plan_json).collect();
        println!("{}", json::success(serde_json::Value::Array(items)));
    } else {
        text::print_plan_list(&plans);
    }
    Ok(0)
}

fn run_show(project_flag: Option<&str>, reference: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;
    let result = query::plan_with_progress(&store, reference, &project.id)?;

    if json_output {
        println!("{}", json::success(serde_json::to_value(&result).expect("PlanWithProgress serializes")));
    } else {
        text::print_plan(&result.plan);
        println!("Tasks:");
        text::print_task_list(&result.tasks);
        println!(
            "Progress: {:.1}% ({}/{})",
            result.progress.percent, result.progress.completed, result.progress.total
        );
    }
    Ok(0)
}

fn run_generate(
    project_flag: Option<&str>,
    reference: &str,
    prompt: &str,
    max_lines_per_task: Option<i32>,
    json_output: bool,
) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;

    let plan = {
        let conn = store.lock();
        plan_repo::resolve_plan(&conn, &project.id, reference)?
    };

    // Fail fast on missing configuration, before the plan ever leaves
    // draft — there's no external call attempted yet to justify moving it.
    let config = crate::config::Config::load()?;
    let api_key = config.anthropic_api_key.ok_or_else(|| {
        crate::error::Error::Invalid("ANTHROPIC_API_KEY is not set; required to call the planner".into())
    })?;
    let planner = AnthropicPlanner::new(api_key);

    // Phase one: draft -> planning, committed before the external call so
    // a crash mid-planning never leaves the plan silently stuck in draft.
    store.transaction(|conn| {
        crate::state_machine::plan_transition(plan.status, PlanStatus::Planning)?;
        plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Planning)
    })?;
    let input = PlannerInput {
        prompt: prompt.to_string(),
        project_digest: None,
        context_snippets: Vec::new(),
        max_lines_per_task,
    };

    let planned = match planner.plan(&input) {
        Ok(output) => output,
        Err(e) => {
            // Restore draft: this is a second, separate transaction, not a
            // rollback of the first.
            let _ = store.transaction(|conn| plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Draft));
            return Err(e);
        }
    };

    // Phase two: persist tasks and edges, then planning -> ready.
    let persisted = store.transaction(|conn| {
        let ids = IdGenerator::new();
        let mut translation = std::collections::HashMap::new();
        for task in &planned.tasks {
            let id = ids.next();
            translation.insert(task.id.clone(), id);
        }

        let edges: Vec<Edge> = planned
            .tasks
            .iter()
            .flat_map(|t| {
                t.depends_on.iter().map(move |dep| Edge {
                    task_id: translation[&t.id].clone(),
                    depends_on_id: translation[dep].clone(),
                })
            })
            .collect();
        let task_ids: Vec<String> = translation.values().cloned().collect();
        let graph = Graph::build(&task_ids, &edges)?;

        for task in &planned.tasks {
            let real_id = &translation[&task.id];
            let level = graph.level(real_id).unwrap_or(0);
            task_repo::create_task(
                conn,
                real_id,
                &plan.id,
                &task.title,
                Some(task.description.as_str()),
                level,
                Some(task.estimated_lines),
            )?;
            let status = if level == 0 { crate::models::TaskStatus::Ready } else { crate::models::TaskStatus::Pending };
            task_repo::update_task_status(conn, real_id, status)?;
        }
        for edge in &edges {
            dependency_repo::add_dependency(conn, &edge.task_id, &edge.depends_on_id)?;
        }

        crate::state_machine::plan_transition(PlanStatus::Planning, PlanStatus::Ready)?;
        plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Ready)?;
        plan_repo::get_plan_by_id(conn, &plan.id)
    });

    let plan = match persisted {
        Ok(plan) => plan,
        Err(e) => {
            let _ = store.transaction(|conn| plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Draft));
            return Err(e);
        }
    };

    if json_output {
        println!("{}", json::success(json::plan_json(&plan)));
    } else {
        text::print_plan(&plan);
        println!("Generated {} task(s): {}", planned.tasks.len(), planned.summary);
    }
    Ok(0)
}

fn run_archive(project_flag: Option<&str>, reference: &str, json_output: bool) -> Result<i32> {
    let store = open_store()?;
    let project = context::resolve_project(&store, project_flag)?;

    let plan = store.transaction(|conn| {
        let plan = plan_repo::resolve_plan(conn, &project.id, reference)?;
        crate::state_machine::plan_transition(plan.status, PlanStatus::Archived)?;
        plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Archived)?;
        plan_repo::get_plan_by_id(conn, &plan.id)
    })?;

    if json_output {
        println!("{}", json::success(json::plan_json(&plan)));
    } else {
        text::print_plan(&plan);
    }
    Ok(0)
}
