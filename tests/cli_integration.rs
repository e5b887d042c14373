//! Binary-level smoke tests (spec §4.L): project/plan/task CRUD, error
//! codes, and exit codes through the real `taskctl` binary. Anything
//! that needs a live planner or forge call is out of scope here — see
//! `tests/scenarios.rs` for the DAG/scheduler lifecycle exercised at the
//! library level.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

struct TestEnv {
    dir: TempDir,
    db_path: std::path::PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        let run = |args: &[&str]| {
            let status = std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .status()
                .expect("spawn git");
            assert!(status.success(), "git {args:?} failed");
        };
        run(&["init", "-q", "-b", "main"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "test"]);
        std::fs::write(dir.path().join("README.md"), "hello\n").expect("write readme");
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "initial"]);

        let db_path = dir.path().join("taskctl.db");
        Self { dir, db_path }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskctl").expect("binary");
        cmd.current_dir(self.dir.path());
        cmd.env("TASKCTL_DB_PATH", &self.db_path);
        cmd.env_remove("ANTHROPIC_API_KEY");
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn init_project(&self) -> String {
        let value = self.run_json(&["project", "init", "--slots", "1"]);
        assert_eq!(value["success"], true);
        value["data"]["id"].as_str().unwrap().to_string()
    }
}

// ─── project ───────────────────────────────────────────────────────

#[test]
fn project_init_provisions_project_and_slots() {
    let env = TestEnv::new();
    let value = env.run_json(&["project", "init", "--name", "demo", "--slots", "2"]);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["name"], "demo");
    assert_eq!(value["data"]["main_branch"], "main");

    let show = env.run_json(&["project", "show", value["data"]["id"].as_str().unwrap()]);
    let slots = show["data"]["slots"].as_array().expect("slots array");
    assert_eq!(slots.len(), 2);
}

#[test]
fn project_init_twice_fails_with_already_exists() {
    let env = TestEnv::new();
    env.init_project();
    let value = env.run_json(&["project", "init"]);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "ALREADY_EXISTS");

    env.cmd().args(["project", "init"]).assert().code(1);
}

#[test]
fn project_init_outside_a_git_repo_fails_with_invalid() {
    let env = TestEnv::new();
    let outside = TempDir::new().expect("tempdir");
    let mut cmd = Command::cargo_bin("taskctl").expect("binary");
    cmd.current_dir(outside.path());
    cmd.env("TASKCTL_DB_PATH", &env.db_path);
    cmd.args(["project", "init", "--json"]);
    let output = cmd.output().expect("run");
    assert_eq!(output.status.code(), Some(1));
    let value: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "INVALID");
}

#[test]
fn project_list_shows_initialised_project() {
    let env = TestEnv::new();
    env.init_project();
    let value = env.run_json(&["project", "list"]);
    let items = value["data"].as_array().expect("array");
    assert_eq!(items.len(), 1);
}

// ─── plan ──────────────────────────────────────────────────────────

#[test]
fn plan_create_list_show_round_trip() {
    let env = TestEnv::new();
    env.init_project();

    let created = env.run_json(&["plan", "create", "add login flow", "--description", "wire up auth"]);
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["status"], "draft");
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let listed = env.run_json(&["plan", "list"]);
    let items = listed["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], plan_id);

    let shown = env.run_json(&["plan", "show", &plan_id]);
    assert_eq!(shown["data"]["plan"]["id"], plan_id);
    assert_eq!(shown["data"]["tasks"].as_array().unwrap().len(), 0);
    assert_eq!(shown["data"]["progress"]["total"], 0);
}

#[test]
fn plan_show_unknown_reference_is_not_found() {
    let env = TestEnv::new();
    env.init_project();
    let value = env.run_json(&["plan", "show", "nonexistent"]);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "NOT_FOUND");
    env.cmd().args(["plan", "show", "nonexistent"]).assert().code(1);
}

#[test]
fn plan_generate_without_api_key_fails_without_touching_the_network() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "add login flow"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["plan", "generate", &plan_id, "add a login form"]);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "INVALID");
    assert!(value["error"]["message"].as_str().unwrap().contains("ANTHROPIC_API_KEY"));

    // missing configuration is caught before the plan ever leaves draft
    let shown = env.run_json(&["plan", "show", &plan_id]);
    assert_eq!(shown["data"]["plan"]["status"], "draft");
}

#[test]
fn plan_archive_is_terminal() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "cleanup task"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let archived = env.run_json(&["plan", "archive", &plan_id]);
    assert_eq!(archived["data"]["status"], "archived");

    let reattempt = env.run_json(&["plan", "archive", &plan_id]);
    assert_eq!(reattempt["success"], false);
    assert_eq!(reattempt["error"]["code"], "INVALID_TRANSITION");
}

// ─── task / schedule / pr: empty-plan behaviour ───────────────────

#[test]
fn task_list_on_empty_plan_is_an_empty_array() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "empty plan"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["task", "list", &plan_id]);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"].as_array().unwrap().len(), 0);
}

#[test]
fn task_show_unknown_task_is_not_found() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "empty plan"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["task", "show", &plan_id, "ghost"]);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "NOT_FOUND");
}

#[test]
fn schedule_status_on_empty_plan_reports_zero_totals() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "empty plan"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["schedule", "status", &plan_id]);
    assert_eq!(value["data"]["total"], 0);
    assert_eq!(value["data"]["pending"], 0);
}

#[test]
fn schedule_dry_run_on_empty_plan_returns_an_empty_batch() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "empty plan"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["schedule", "run", &plan_id, "--dry-run"]);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["assigned"], false);
    assert_eq!(value["data"]["batch"].as_array().unwrap().len(), 0);
}

#[test]
fn pr_list_on_empty_plan_is_an_empty_array() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "empty plan"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["pr", "list", &plan_id]);
    assert_eq!(value["data"].as_array().unwrap().len(), 0);
}

#[test]
fn status_command_reuses_plan_with_progress_projection() {
    let env = TestEnv::new();
    env.init_project();
    let created = env.run_json(&["plan", "create", "empty plan"]);
    let plan_id = created["data"]["id"].as_str().unwrap().to_string();

    let value = env.run_json(&["status", &plan_id]);
    assert_eq!(value["data"]["plan"]["id"], plan_id);
    assert_eq!(value["data"]["progress"]["total"], 0);
}

// ─── non-JSON text mode smoke test ────────────────────────────────

#[test]
fn non_json_mode_prints_human_readable_text() {
    let env = TestEnv::new();
    env.init_project();
    env.cmd()
        .args(["plan", "create", "add login flow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add login flow"));
}
