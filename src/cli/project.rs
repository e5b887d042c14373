//! `project` subcommand handlers (spec §4.L). `init` is the one place
//! that provisions the worktree slot pool: each slot gets its own
//! dedicated branch up front, since git refuses to check the same
//! branch out in two worktrees at once.

use crate::cli::commands::ProjectCommands;
use crate::cli::context::{self, path_to_string};
use crate::db::{project_repo, slot_repo};
use crate::error::{Error, Result};
use crate::git;
use crate::id::IdGenerator;
use crate::output::{json, text};

pub fn run(cmd: ProjectCommands, json_output: bool) -> i32 {
    let result = match cmd {
        ProjectCommands::Init { name, slots, max_concurrency } => run_init(name, slots, max_concurrency, json_output),
        ProjectCommands::List => run_list(json_output),
        ProjectCommands::Show { reference } => run_show(&reference, json_output),
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

fn run_init(name: Option<String>, slots: u32, max_concurrency: Option<i32>, json_output: bool) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    if !git::is_repo(&cwd) {
        return Err(Error::Invalid("current directory is not inside a git repository".into()));
    }
    let repo_root = git::repo_root(&cwd)?;
    let repo_root_str = path_to_string(&repo_root);
    let main_branch = git::current_branch(&repo_root)?;
    let remote_url = git::remote_url(&repo_root, "origin")?;

    let store = context::open_store()?;
    let ids = IdGenerator::new();

    let conn = store.lock();
    if project_repo::find_project_by_repo_root(&conn, &repo_root_str)?.is_some() {
        return Err(Error::already_exists("project", repo_root_str));
    }

    let project_name = name.unwrap_or_else(|| {
        repo_root.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "project".to_string())
    });

    let project = project_repo::create_project(
        &conn,
        &ids.next(),
        &project_name,
        &repo_root_str,
        remote_url.as_deref(),
        &main_branch,
        max_concurrency,
    )?;

    let slots_dir = repo_root.join(".taskctl-slots");
    for i in 0..slots {
        let slot_name = format!("slot-{i}");
        let slot_path = slots_dir.join(&slot_name);
        let slot_branch = format!("taskctl/{slot_name}");
        git::add_worktree(&repo_root, &slot_path, Some(&slot_branch))?;
        slot_repo::create_slot(&conn, &ids.next(), &project.id, &slot_name, &path_to_string(&slot_path))?;
    }
    drop(conn);

    if json_output {
        println!("{}", json::success(json::project_json(&project)));
    } else {
        text::print_project(&project);
        println!("Provisioned {slots} worktree slot(s) under {}", slots_dir.display());
    }
    Ok(0)
}

fn run_list(json_output: bool) -> Result<i32> {
    let store = context::open_store()?;
    let conn = store.lock();
    let projects = project_repo::list_projects(&conn)?;
    drop(conn);

    if json_output {
        let items: Vec<_> = projects.iter().map(json::project_json).collect();
        println!("{}", json::success(serde_json::Value::Array(items)));
    } else {
        text::print_project_list(&projects);
    }
    Ok(0)
}

fn run_show(reference: &str, json_output: bool) -> Result<i32> {
    let store = context::open_store()?;
    let conn = store.lock();
    let project = project_repo::resolve_project(&conn, reference)?;
    let slots = slot_repo::list_slots_by_project(&conn, &project.id)?;
    drop(conn);

    if json_output {
        let mut value = json::project_json(&project);
        value["slots"] = serde_json::Value::Array(slots.iter().map(json::slot_json).collect());
        println!("{}", json::success(value));
    } else {
        text::print_project(&project);
        println!("Slots:");
        text::print_slot_list(&slots);
    }
    Ok(0)
}
