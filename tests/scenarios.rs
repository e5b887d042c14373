//! Library-level integration tests for the six seeded scenarios and a
//! handful of the universal invariants. These exercise `Store`, the
//! `*_repo` modules, `graph::Graph`, and `scheduler::*` directly rather
//! than going through the CLI binary, since planner generation needs a
//! live network call the binary has no local stub for.

use std::collections::HashSet;
use std::path::Path;

use taskctl::db::connection::Store;
use taskctl::db::{dependency_repo, plan_repo, pr_repo, project_repo, slot_repo, task_repo};
use taskctl::error::Error;
use taskctl::graph::{Edge, Graph};
use taskctl::id::IdGenerator;
use taskctl::models::{Plan, PlanStatus, Project, PullRequestStatus, SlotStatus, TaskStatus};
use taskctl::query;
use taskctl::scheduler::{self, SchedulerState};
use taskctl::state_machine;
use tempfile::TempDir;

fn init_repo() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
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
    dir
}

fn open_store(dir: &Path) -> Store {
    Store::open(dir.join("taskctl.db")).expect("open store")
}

fn make_project(store: &Store, repo_root: &Path, max_concurrency: Option<i32>) -> Project {
    let ids = IdGenerator::new();
    let conn = store.lock();
    project_repo::create_project(
        &conn,
        &ids.next(),
        "demo",
        repo_root.to_str().expect("utf8 path"),
        None,
        "main",
        max_concurrency,
    )
    .expect("create project")
}

fn make_plan(store: &Store, project: &Project, ids: &IdGenerator) -> Plan {
    let conn = store.lock();
    plan_repo::create_plan(&conn, &ids.next(), &project.id, "demo plan", None, "main").expect("create plan")
}

// ─── scenario 1: generate -> persist ──────────────────────────────

#[test]
fn generate_persists_levels_and_readiness() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), None);
    let ids = IdGenerator::new();
    let plan = make_plan(&store, &project, &ids);

    // planner output: t1, t2 independent; t3 depends on both
    let t1 = ids.next();
    let t2 = ids.next();
    let t3 = ids.next();
    let task_ids = vec![t1.clone(), t2.clone(), t3.clone()];
    let edges = vec![
        Edge { task_id: t3.clone(), depends_on_id: t1.clone() },
        Edge { task_id: t3.clone(), depends_on_id: t2.clone() },
    ];

    let graph = Graph::build(&task_ids, &edges).expect("acyclic plan");

    store
        .transaction(|conn| {
            let current = plan_repo::get_plan_by_id(conn, &plan.id)?;
            state_machine::plan_transition(current.status, PlanStatus::Planning)?;
            plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Planning)
        })
        .expect("commit to planning");

    store
        .transaction(|conn| {
            for id in &task_ids {
                let level = graph.level(id).expect("every id has a level");
                task_repo::create_task(conn, id, &plan.id, &format!("task {id}"), None, level, None)?;
            }
            for edge in &edges {
                dependency_repo::add_dependency(conn, &edge.task_id, &edge.depends_on_id)?;
            }
            let completed = HashSet::new();
            let ready = graph.ready_set(task_ids.iter().map(String::as_str), &completed);
            for id in &task_ids {
                let status = if ready.contains(id) { TaskStatus::Ready } else { TaskStatus::Pending };
                task_repo::update_task_status(conn, id, status)?;
            }
            state_machine::plan_transition(PlanStatus::Planning, PlanStatus::Ready)?;
            plan_repo::update_plan_status(conn, &plan.id, PlanStatus::Ready)
        })
        .expect("persist tasks and edges");

    let conn = store.lock();
    assert_eq!(task_repo::get_task_by_id(&conn, &t1).unwrap().level, 0);
    assert_eq!(task_repo::get_task_by_id(&conn, &t2).unwrap().level, 0);
    assert_eq!(task_repo::get_task_by_id(&conn, &t3).unwrap().level, 1);
    assert_eq!(task_repo::get_task_by_id(&conn, &t1).unwrap().status, TaskStatus::Ready);
    assert_eq!(task_repo::get_task_by_id(&conn, &t2).unwrap().status, TaskStatus::Ready);
    assert_eq!(task_repo::get_task_by_id(&conn, &t3).unwrap().status, TaskStatus::Pending);
    assert_eq!(plan_repo::get_plan_by_id(&conn, &plan.id).unwrap().status, PlanStatus::Ready);
}

// ─── scenario 2: schedule under cap ───────────────────────────────

#[test]
fn schedule_assigns_up_to_available_slots() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), Some(2));
    let ids = IdGenerator::new();
    let plan = make_plan(&store, &project, &ids);

    let task_ids: Vec<String> = (0..4)
        .map(|_| {
            let conn = store.lock();
            let id = ids.next();
            task_repo::create_task(&conn, &id, &plan.id, "independent task", None, 0, None).unwrap();
            task_repo::update_task_status(&conn, &id, TaskStatus::Ready).unwrap();
            id
        })
        .collect();

    for i in 0..2 {
        let slot_path = repo.path().join(".taskctl-slots").join(format!("slot-{i}"));
        taskctl::git::add_worktree(repo.path(), &slot_path, Some(&format!("taskctl/slot-{i}"))).expect("add worktree");
        let conn = store.lock();
        slot_repo::create_slot(&conn, &ids.next(), &project.id, &format!("slot-{i}"), slot_path.to_str().unwrap())
            .expect("create slot");
    }

    let state = {
        let conn = store.lock();
        SchedulerState::initialise(&conn, &plan.id).expect("initialise")
    };
    let batch = {
        let conn = store.lock();
        scheduler::next_batch(&conn, &state, &project.id, 2).expect("next_batch")
    };
    assert_eq!(batch.len(), 2, "only two slots available for four ready tasks");

    scheduler::assign(&store, &project.main_branch, &batch, &scheduler::Cancel::new()).expect("assign");

    let conn = store.lock();
    let assigned: HashSet<&str> = batch.iter().map(|b| b.task_id.as_str()).collect();
    let mut in_progress_count = 0;
    let mut still_ready = 0;
    for id in &task_ids {
        let task = task_repo::get_task_by_id(&conn, id).unwrap();
        if assigned.contains(id.as_str()) {
            assert_eq!(task.status, TaskStatus::Assigned);
            assert!(task.slot_id.is_some());
            assert!(task.branch_name.is_some());
            in_progress_count += 1;
        } else {
            assert_eq!(task.status, TaskStatus::Ready);
            still_ready += 1;
        }
    }
    assert_eq!(in_progress_count, 2);
    assert_eq!(still_ready, 2);

    let slots = slot_repo::list_slots_by_project(&conn, &project.id).unwrap();
    let available_slots = slots.iter().filter(|s| s.status == SlotStatus::Available).count();
    assert_eq!(available_slots, 0);
    // assignment symmetry: each bound slot's task_id agrees with that task's slot_id
    for slot in &slots {
        let bound_task = slot.task_id.as_ref().expect("slot bound");
        let task = task_repo::get_task_by_id(&conn, bound_task).unwrap();
        assert_eq!(task.slot_id.as_deref(), Some(slot.id.as_str()));
    }
}

// ─── scenario 3: cycle rejection ──────────────────────────────────

#[test]
fn cycle_is_rejected_and_leaves_no_trace() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), None);
    let ids = IdGenerator::new();
    let plan = make_plan(&store, &project, &ids);

    let a = ids.next();
    let b = ids.next();
    let c = ids.next();
    let task_ids = vec![a.clone(), b.clone(), c.clone()];
    {
        let conn = store.lock();
        for id in &task_ids {
            task_repo::create_task(&conn, id, &plan.id, "cyclic task", None, 0, None).unwrap();
        }
    }

    // A -> B -> C -> A
    let edges = vec![
        Edge { task_id: a.clone(), depends_on_id: b.clone() },
        Edge { task_id: b.clone(), depends_on_id: c.clone() },
        Edge { task_id: c.clone(), depends_on_id: a.clone() },
    ];

    let result = Graph::build(&task_ids, &edges);
    match result {
        Err(Error::Cycle { involving }) => {
            assert_eq!(involving, a, "first-visited node in task_ids order is reported");
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }

    // the graph build failed before any persistence was attempted, so
    // every task is still in its initial pending state
    let conn = store.lock();
    for id in &task_ids {
        assert_eq!(task_repo::get_task_by_id(&conn, id).unwrap().status, TaskStatus::Pending);
    }
}

// ─── scenario 4: merge completion cascades to dependents ──────────

#[test]
fn merge_completes_task_and_unblocks_dependent() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), None);
    let ids = IdGenerator::new();
    let plan = make_plan(&store, &project, &ids);

    let t1 = ids.next();
    let t2 = ids.next();
    {
        let conn = store.lock();
        task_repo::create_task(&conn, &t1, &plan.id, "t1", None, 0, None).unwrap();
        task_repo::create_task(&conn, &t2, &plan.id, "t2", None, 1, None).unwrap();
        dependency_repo::add_dependency(&conn, &t2, &t1).unwrap();
        // t1 has progressed through assignment to having an open PR
        task_repo::update_task_status(&conn, &t1, TaskStatus::PrCreated).unwrap();
        pr_repo::create_pr(&conn, &ids.next(), &t1, 42, "https://example.invalid/pr/42", "main", "feature/t1").unwrap();
    }

    // forge reports the PR as merged
    let pr = { let conn = store.lock(); pr_repo::get_pr_by_task_id(&conn, &t1).unwrap().unwrap() };
    store
        .transaction(|conn| {
            state_machine::pr_transition(pr.status, PullRequestStatus::Merged)?;
            pr_repo::update_pr_status(conn, &pr.id, PullRequestStatus::Merged)
        })
        .expect("forge-reported merge is accepted from open");

    store
        .transaction(|conn| {
            let current = task_repo::get_task_by_id(conn, &t1)?;
            if current.status != TaskStatus::InReview {
                state_machine::task_transition(current.status, TaskStatus::InReview)?;
                task_repo::update_task_status(conn, &t1, TaskStatus::InReview)?;
            }
            Ok(())
        })
        .unwrap();

    scheduler::complete(&store, &t1, false).expect("complete merged task");

    let conn = store.lock();
    let pr = pr_repo::get_pr_by_task_id(&conn, &t1).unwrap().unwrap();
    assert_eq!(pr.status, PullRequestStatus::Merged);
    let t1_row = task_repo::get_task_by_id(&conn, &t1).unwrap();
    assert_eq!(t1_row.status, TaskStatus::Completed);
    let t2_row = task_repo::get_task_by_id(&conn, &t2).unwrap();
    assert_eq!(t2_row.status, TaskStatus::Ready, "t2 moves from pending to ready once t1 completes");
}

// ─── scenario 5: prefix ambiguity ─────────────────────────────────

#[test]
fn ambiguous_prefix_lists_both_candidates() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), None);

    let conn = store.lock();
    let id_a = "01AR0000000000000000000001";
    let id_b = "01AR0000000000000000000002";
    plan_repo::create_plan(&conn, id_a, &project.id, "plan a", None, "main").unwrap();
    plan_repo::create_plan(&conn, id_b, &project.id, "plan b", None, "main").unwrap();

    match plan_repo::resolve_plan(&conn, &project.id, "01AR") {
        Err(Error::Ambiguous { reference, candidates }) => {
            assert_eq!(reference, "01AR");
            assert_eq!(candidates.len(), 2);
            assert!(candidates.iter().any(|c| c.contains(id_a)));
            assert!(candidates.iter().any(|c| c.contains(id_b)));
        }
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

// ─── scenario 6: current-task lookup (worktree-pool variant) ─────

#[test]
fn current_task_resolves_by_branch_name_not_session() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), Some(1));
    let ids = IdGenerator::new();
    let plan = make_plan(&store, &project, &ids);

    let t1 = ids.next();
    let slot_path = repo.path().join(".taskctl-slots").join("slot-0");
    taskctl::git::add_worktree(repo.path(), &slot_path, Some("taskctl/slot-0")).unwrap();

    let slot = {
        let conn = store.lock();
        task_repo::create_task(&conn, &t1, &plan.id, "t1", None, 0, None).unwrap();
        slot_repo::create_slot(&conn, &ids.next(), &project.id, "slot-0", slot_path.to_str().unwrap()).unwrap()
    };

    let branch = "feature/demo/t1-task";
    {
        let conn = store.lock();
        task_repo::assign_task(&conn, &t1, TaskStatus::Assigned, branch, &slot.id).unwrap();
    }

    let found = query::current_task(&store, branch).expect("query ok").expect("task bound to this branch");
    assert_eq!(found.task.id, t1);

    let missing = query::current_task(&store, "feature/does-not-exist").expect("query ok");
    assert!(missing.is_none());
}

// ─── a few boundary behaviours not already covered by graph::engine ──

#[test]
fn empty_plan_has_no_levels_and_is_vacuously_acyclic() {
    let graph = Graph::build(&[], &[]).expect("empty graph is acyclic");
    assert_eq!(graph.max_level(), 0);
    assert!(graph.critical_path().is_empty());
}

#[test]
fn plan_status_round_trips_through_its_string_form() {
    for status in [
        PlanStatus::Draft,
        PlanStatus::Planning,
        PlanStatus::Ready,
        PlanStatus::InProgress,
        PlanStatus::Completed,
        PlanStatus::Archived,
    ] {
        assert_eq!(PlanStatus::from_str(status.as_str()), Some(status));
    }
}

#[test]
fn task_cannot_be_completed_without_a_merged_pr_unless_forced() {
    let repo = init_repo();
    let store = open_store(repo.path());
    let project = make_project(&store, repo.path(), None);
    let ids = IdGenerator::new();
    let plan = make_plan(&store, &project, &ids);

    let t1 = ids.next();
    {
        let conn = store.lock();
        task_repo::create_task(&conn, &t1, &plan.id, "t1", None, 0, None).unwrap();
        task_repo::update_task_status(&conn, &t1, TaskStatus::InReview).unwrap();
    }

    let err = scheduler::complete(&store, &t1, false).expect_err("no PR yet, and not forced");
    assert_eq!(err.code(), taskctl::error::ErrorCode::Invalid);

    scheduler::complete(&store, &t1, true).expect("force bypasses the merge requirement");
    let conn = store.lock();
    assert_eq!(task_repo::get_task_by_id(&conn, &t1).unwrap().status, TaskStatus::Completed);
}
