//! Status-transition guardrails (spec §4.I). Every status change goes
//! through one of these validators before it reaches a `db::*_repo`
//! update call, so an out-of-band change always surfaces as
//! `InvalidTransition` rather than a silent write.

use crate::error::{Error, Result};
use crate::models::{PlanStatus, PullRequestStatus, SlotStatus, TaskStatus};

pub fn plan_transition(from: PlanStatus, to: PlanStatus) -> Result<()> {
    use PlanStatus::*;
    let allowed = match from {
        Draft => matches!(to, Planning | Archived),
        Planning => matches!(to, Ready | Draft | Archived),
        Ready => matches!(to, InProgress | Archived),
        InProgress => matches!(to, Completed | Archived),
        Completed => matches!(to, Archived),
        Archived => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::invalid_transition("plan", from.as_str(), to.as_str()))
    }
}

pub fn task_transition(from: TaskStatus, to: TaskStatus) -> Result<()> {
    use TaskStatus::*;
    let allowed = match from {
        Pending => matches!(to, Ready | Blocked),
        Ready => matches!(to, Assigned | Blocked),
        Assigned => matches!(to, InProgress),
        InProgress => matches!(to, PrCreated),
        PrCreated => matches!(to, InReview),
        InReview => matches!(to, Completed | InProgress),
        Blocked => matches!(to, Pending | Ready),
        Completed => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::invalid_transition("task", from.as_str(), to.as_str()))
    }
}

pub fn slot_transition(from: SlotStatus, to: SlotStatus) -> Result<()> {
    use SlotStatus::*;
    let allowed = match from {
        Available => matches!(to, Assigned | Error),
        Assigned => matches!(to, InProgress | Error | Available),
        InProgress => matches!(to, PrPending | Error | Available),
        PrPending => matches!(to, Completed | Error | Available),
        Completed => matches!(to, Available),
        Error => matches!(to, Available),
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::invalid_transition("slot", from.as_str(), to.as_str()))
    }
}

pub fn pr_transition(from: PullRequestStatus, to: PullRequestStatus) -> Result<()> {
    use PullRequestStatus::*;
    // Forge-reported state is authoritative and polled, not staged locally,
    // so a sync can observe a merge or close from any non-terminal status
    // (e.g. an admin merge that skips review) rather than only from Approved.
    let allowed = match from {
        Draft => matches!(to, Open | Closed | Merged),
        Open => matches!(to, InReview | Closed | Merged),
        InReview => matches!(to, Approved | Closed | Merged),
        Approved => matches!(to, Merged | Closed),
        Merged => false,
        Closed => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(Error::invalid_transition("pull_request", from.as_str(), to.as_str()))
    }
}

/// Task→`assigned` requires a slot assignment (or branch name in the
/// session variant, unused here — see SPEC_FULL §3).
pub fn require_slot_for_assignment(slot_id: Option<&str>) -> Result<()> {
    if slot_id.is_some() {
        Ok(())
    } else {
        Err(Error::Invalid("task cannot move to assigned without a slot".into()))
    }
}

/// Task→`pr_created` requires a PR row whose `task_id` matches.
pub fn require_pr_for_task(pr_task_id: Option<&str>, task_id: &str) -> Result<()> {
    match pr_task_id {
        Some(id) if id == task_id => Ok(()),
        _ => Err(Error::Invalid(format!("task {task_id} cannot move to pr_created without a matching PR"))),
    }
}

/// Task→`completed` requires either a merged PR or an explicit `force`.
pub fn require_merge_or_force(pr_status: Option<PullRequestStatus>, force: bool) -> Result<()> {
    if force || pr_status == Some(PullRequestStatus::Merged) {
        Ok(())
    } else {
        Err(Error::Invalid("task cannot be completed without a merged PR (use force)".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_pending_to_ready_allowed() {
        assert!(task_transition(TaskStatus::Pending, TaskStatus::Ready).is_ok());
    }

    #[test]
    fn task_completed_is_terminal() {
        assert!(task_transition(TaskStatus::Completed, TaskStatus::Pending).is_err());
    }

    #[test]
    fn task_cannot_skip_assigned() {
        assert!(task_transition(TaskStatus::Ready, TaskStatus::InProgress).is_err());
    }

    #[test]
    fn slot_available_requires_clearing() {
        assert!(slot_transition(SlotStatus::Completed, SlotStatus::Available).is_ok());
        assert!(slot_transition(SlotStatus::Available, SlotStatus::InProgress).is_err());
    }

    #[test]
    fn pr_merged_is_terminal() {
        assert!(pr_transition(PullRequestStatus::Merged, PullRequestStatus::Closed).is_err());
    }

    #[test]
    fn completion_requires_merge_or_force() {
        assert!(require_merge_or_force(Some(PullRequestStatus::Open), false).is_err());
        assert!(require_merge_or_force(Some(PullRequestStatus::Merged), false).is_ok());
        assert!(require_merge_or_force(None, true).is_ok());
    }
}
