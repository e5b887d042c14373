//! Scheduler (spec §4.F): the central coordinator mapping ready tasks to
//! a pool of reusable slots. `assign`'s per-pairing git work runs
//! concurrently on scoped threads (spec §5 "cooperatively concurrent
//! within one invocation"); every store mutation still flows through the
//! single `Store::transaction` serialisation point afterwards.

pub mod branch;
pub mod state;

use std::path::Path;

use crate::db::connection::Store;
use crate::db::{dependency_repo, plan_repo, slot_repo, task_repo};
use crate::error::{Error, Result};
use crate::git;
use crate::models::{PlanStatus, SlotStatus, TaskStatus};

pub use state::{SchedulerProgress, SchedulerState};

/// Cooperative cancellation flag (spec §5 concretisation): a plain
/// `Arc<AtomicBool>` rather than an async runtime's cancellation token,
/// since the rest of the crate is synchronous. Checked between
/// scoped-thread joins and before each adapter call in [`assign`] — not
/// preemptive, so a call already blocked inside `git`/`gh` still runs to
/// its own timeout before cancellation is observed.
#[derive(Clone, Default)]
pub struct Cancel(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// One ready task paired with an available slot, produced by
/// [`next_batch`] and consumed by [`assign`].
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub task_id: String,
    pub slot_id: String,
    pub branch_name: String,
}

/// `next_batch` (spec §4.F): ready set minus in-progress, zipped with
/// available slots up to `min(max_concurrent - |in_progress|,
/// available_slots, ready)`. Pure — callers decide whether to `assign`.
pub fn next_batch(
    conn: &rusqlite::Connection,
    state: &SchedulerState,
    project_id: &str,
    max_concurrent: usize,
) -> Result<Vec<ScheduledTask>> {
    let ready = state.ready_ordered();
    let remaining_capacity = max_concurrent.saturating_sub(state.in_progress.len());

    let mut available_slots = slot_repo::list_slots_by_project(conn, project_id)?;
    available_slots.retain(|s| s.status == SlotStatus::Available);
    available_slots.sort_by(|a, b| a.name.cmp(&b.name));

    let batch_size = remaining_capacity.min(available_slots.len()).min(ready.len());

    let mut batch = Vec::with_capacity(batch_size);
    for i in 0..batch_size {
        let task_id = &ready[i];
        let slot = &available_slots[i];
        let task = state.tasks.get(task_id).ok_or_else(|| Error::not_found("task", task_id))?;
        let name = branch::branch_name(&state.plan_id, &task.id, &task.title);
        batch.push(ScheduledTask { task_id: task_id.clone(), slot_id: slot.id.clone(), branch_name: name });
    }
    Ok(batch)
}

/// `assign` (spec §4.F): for each pairing, branch the task's branch
/// directly off the project's main branch (never checking main itself
/// out in the slot's worktree — it is typically already checked out in
/// the primary working tree, and git refuses to check the same branch
/// out in two worktrees at once) then check out that branch. A failed
/// branch creation is tolerated (the branch may exist from a previous
/// run) unless it is already owned by a *different* task (§9
/// branch-ownership race resolution), in which case the pairing fails
/// earlier with `Conflict`. Git work for independent pairings runs on
/// scoped threads; the store write is one transaction applying every
/// pairing or none. `cancel` is polled before the pre-flight check, before
/// each pairing's git work is spawned, and after the scoped threads join;
/// an already-cancelled token fails the whole batch with `Error::Cancelled`
/// before any git state is touched.
pub fn assign(store: &Store, project_main_branch: &str, batch: &[ScheduledTask], cancel: &Cancel) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    // Pre-flight: verify branch ownership before touching git state, so a
    // conflict never leaves a half-checked-out worktree behind.
    {
        let conn = store.lock();
        for pairing in batch {
            if let Some(existing) = task_repo::get_task_by_branch_name(&conn, &pairing.branch_name)? {
                if existing.id != pairing.task_id {
                    return Err(Error::Conflict(format!(
                        "branch {} is already owned by task {}",
                        pairing.branch_name, existing.id
                    )));
                }
            }
        }
    }

    let slot_paths: Vec<(String, std::path::PathBuf)> = {
        let conn = store.lock();
        batch
            .iter()
            .map(|p| slot_repo::get_slot_by_id(&conn, &p.slot_id).map(|s| (p.slot_id.clone(), std::path::PathBuf::from(s.path))))
            .collect::<Result<Vec<_>>>()?
    };

    std::thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(batch.len());
        for pairing in batch {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let (_, path) = slot_paths.iter().find(|(id, _)| id == &pairing.slot_id).expect("slot path resolved above");
            let path: &Path = path.as_path();
            let branch_name = pairing.branch_name.clone();
            let main_branch = project_main_branch.to_string();
            handles.push(scope.spawn(move || -> Result<()> {
                // Ignore the error: the branch may already exist from a
                // previous assign (ownership was verified above).
                let _ = git::create_branch(path, &branch_name, Some(&main_branch));
                git::checkout_branch(path, &branch_name)?;
                Ok(())
            }));
        }
        for handle in handles {
            handle.join().expect("git worker thread panicked")?;
        }
        Ok(())
    })?;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    store.transaction(|conn| {
        for pairing in batch {
            let task = task_repo::get_task_by_id(conn, &pairing.task_id)?;
            let slot = slot_repo::get_slot_by_id(conn, &pairing.slot_id)?;
            crate::state_machine::require_slot_for_assignment(Some(&pairing.slot_id))?;
            crate::state_machine::task_transition(task.status, TaskStatus::Assigned)?;
            crate::state_machine::slot_transition(slot.status, SlotStatus::Assigned)?;
            slot_repo::bind_slot(conn, &pairing.slot_id, SlotStatus::Assigned, &pairing.branch_name, &pairing.task_id)?;
            task_repo::assign_task(conn, &pairing.task_id, TaskStatus::Assigned, &pairing.branch_name, &pairing.slot_id)?;
        }
        Ok(())
    })
}

/// `start` (spec §4.F, and SPEC_FULL §4.F's resolution of the
/// assigned→in_progress open question): explicit, operator-triggered.
pub fn start(store: &Store, task_id: &str) -> Result<()> {
    store.transaction(|conn| {
        let task = task_repo::get_task_by_id(conn, task_id)?;
        crate::state_machine::task_transition(task.status, TaskStatus::InProgress)?;
        task_repo::update_task_status(conn, task_id, TaskStatus::InProgress)?;
        if let Some(slot_id) = &task.slot_id {
            let slot = slot_repo::get_slot_by_id(conn, slot_id)?;
            crate::state_machine::slot_transition(slot.status, SlotStatus::InProgress)?;
            slot_repo::update_slot_status(conn, slot_id, SlotStatus::InProgress)?;
        }
        Ok(())
    })
}

/// `mark_pr_created` (spec §4.F): task → `pr_created`, slot → `pr_pending`.
/// Requires a PR row whose `task_id` matches (§4.I cross-entity guardrail).
pub fn mark_pr_created(store: &Store, task_id: &str) -> Result<()> {
    store.transaction(|conn| {
        let task = task_repo::get_task_by_id(conn, task_id)?;
        let pr = crate::db::pr_repo::get_pr_by_task_id(conn, task_id)?;
        crate::state_machine::require_pr_for_task(pr.as_ref().map(|p| p.task_id.as_str()), task_id)?;
        crate::state_machine::task_transition(task.status, TaskStatus::PrCreated)?;
        task_repo::update_task_status(conn, task_id, TaskStatus::PrCreated)?;
        if let Some(slot_id) = &task.slot_id {
            let slot = slot_repo::get_slot_by_id(conn, slot_id)?;
            crate::state_machine::slot_transition(slot.status, SlotStatus::PrPending)?;
            slot_repo::update_slot_status(conn, slot_id, SlotStatus::PrPending)?;
        }
        Ok(())
    })
}

/// `complete` (spec §4.F): task → `completed`, slot → `completed` then
/// released to `available`. Any dependent whose remaining dependencies
/// are now all completed becomes eligible on the next `next_batch` —
/// left to the caller's next `initialise`, since readiness here is a
/// pure function recomputed from the store rather than cached state.
pub fn complete(store: &Store, task_id: &str, force: bool) -> Result<()> {
    store.transaction(|conn| {
        let task = task_repo::get_task_by_id(conn, task_id)?;
        crate::state_machine::task_transition(task.status, TaskStatus::Completed)?;

        let pr = crate::db::pr_repo::get_pr_by_task_id(conn, task_id)?;
        crate::state_machine::require_merge_or_force(pr.map(|p| p.status), force)?;

        task_repo::release_slot(conn, task_id, TaskStatus::Completed)?;
        if let Some(slot_id) = &task.slot_id {
            let slot = slot_repo::get_slot_by_id(conn, slot_id)?;
            crate::state_machine::slot_transition(slot.status, SlotStatus::Completed)?;
            slot_repo::update_slot_status(conn, slot_id, SlotStatus::Completed)?;
            crate::state_machine::slot_transition(SlotStatus::Completed, SlotStatus::Available)?;
            slot_repo::release_slot(conn, slot_id)?;
        }

        unblock_dependents(conn, task_id)?;
        Ok(())
    })
}

/// Move each dependent of `completed_task_id` from `pending`/`blocked` to
/// `ready` once every one of its own dependencies is `completed` —
/// otherwise the dependent would only ever become schedulable through a
/// fresh `SchedulerState::initialise`, leaving its stored status stale.
fn unblock_dependents(conn: &rusqlite::Connection, completed_task_id: &str) -> Result<()> {
    for dependent_id in dependency_repo::get_dependents(conn, completed_task_id)? {
        let dependent = task_repo::get_task_by_id(conn, &dependent_id)?;
        if !matches!(dependent.status, TaskStatus::Pending | TaskStatus::Blocked) {
            continue;
        }
        if dependency_repo::all_dependencies_completed(conn, &dependent_id)? {
            crate::state_machine::task_transition(dependent.status, TaskStatus::Ready)?;
            task_repo::update_task_status(conn, &dependent_id, TaskStatus::Ready)?;
        }
    }
    Ok(())
}

/// `update_plan_progress` (spec §4.F): plan → `completed` when every
/// task is completed; plan → `in_progress` while any task is active or
/// completed.
pub fn update_plan_progress(store: &Store, plan_id: &str) -> Result<()> {
    store.transaction(|conn| {
        let progress = task_repo::task_progress(conn, plan_id)?;
        let plan = plan_repo::get_plan_by_id(conn, plan_id)?;

        let active_or_completed = progress.assigned
            + progress.in_progress
            + progress.pr_created
            + progress.in_review
            + progress.completed;

        let next_status = if progress.total > 0 && progress.completed == progress.total {
            PlanStatus::Completed
        } else if active_or_completed > 0 {
            PlanStatus::InProgress
        } else {
            plan.status
        };

        if next_status != plan.status {
            crate::state_machine::plan_transition(plan.status, next_status)?;
            plan_repo::update_plan_status(conn, plan_id, next_status)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_starts_clear_and_latches_once_set() {
        let cancel = Cancel::new();
        assert!(!cancel.is_cancelled());
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn cancel_clone_shares_the_same_flag() {
        let cancel = Cancel::new();
        let clone = cancel.clone();
        clone.cancel();
        assert!(cancel.is_cancelled(), "cloning shares the Arc, not a fresh flag");
    }

    #[test]
    fn assign_on_an_already_cancelled_token_fails_before_touching_git() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let store = Store::open(dir.path().join("taskctl.db")).expect("open store");
        let cancel = Cancel::new();
        cancel.cancel();

        let batch = vec![ScheduledTask {
            task_id: "nonexistent-task".into(),
            slot_id: "nonexistent-slot".into(),
            branch_name: "feature/whatever".into(),
        }];

        let err = assign(&store, "main", &batch, &cancel).expect_err("cancelled token short-circuits");
        assert!(matches!(err, Error::Cancelled));
    }
}

