//! Scheduler state (spec §4.F): derivable from the store but cached for
//! one `initialise`..`complete` invocation sequence.

use std::collections::{HashMap, HashSet};

use crate::db::{dependency_repo, task_repo};
use crate::error::Result;
use crate::graph::{Edge, Graph};
use crate::models::{Task, TaskStatus};

pub struct SchedulerState {
    pub plan_id: String,
    pub graph: Graph,
    pub tasks: HashMap<String, Task>,
    pub completed: HashSet<String>,
    pub in_progress: HashSet<String>,
    pub assignment: HashMap<String, String>,
}

impl SchedulerState {
    /// `initialise` (spec §4.F): read plan tasks and edges, build the
    /// graph, partition existing task status into completed/in_progress.
    pub fn initialise(conn: &rusqlite::Connection, plan_id: &str) -> Result<Self> {
        let all_tasks = task_repo::list_tasks_by_plan(conn, plan_id)?;
        let task_ids: Vec<String> = all_tasks.iter().map(|t| t.id.clone()).collect();

        let deps = dependency_repo::get_all_dependencies_for_plan(conn, plan_id)?;
        let edges: Vec<Edge> =
            deps.into_iter().map(|d| Edge { task_id: d.task_id, depends_on_id: d.depends_on_id }).collect();

        let graph = Graph::build(&task_ids, &edges)?;

        let mut completed = HashSet::new();
        let mut in_progress = HashSet::new();
        let mut assignment = HashMap::new();
        let mut tasks = HashMap::new();
        for task in all_tasks {
            if task.status == TaskStatus::Completed {
                completed.insert(task.id.clone());
            } else if task.status.is_active() {
                in_progress.insert(task.id.clone());
                if let Some(slot_id) = &task.slot_id {
                    assignment.insert(task.id.clone(), slot_id.clone());
                }
            }
            tasks.insert(task.id.clone(), task);
        }

        Ok(Self { plan_id: plan_id.to_string(), graph, tasks, completed, in_progress, assignment })
    }

    /// Ready set minus in-progress, ordered (level asc, id asc) per
    /// spec §4.F's fairness rule.
    pub fn ready_ordered(&self) -> Vec<String> {
        let candidates: Vec<&str> = self
            .tasks
            .values()
            .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::Ready))
            .filter(|t| !self.in_progress.contains(&t.id))
            .map(|t| t.id.as_str())
            .collect();

        let mut ready = self.graph.ready_set(candidates, &self.completed);
        ready.sort_by(|a, b| {
            let level_a = self.graph.level(a).unwrap_or(0);
            let level_b = self.graph.level(b).unwrap_or(0);
            level_a.cmp(&level_b).then_with(|| a.cmp(b))
        });
        ready
    }

    pub fn is_complete(&self) -> bool {
        self.completed.len() == self.tasks.len()
    }

    pub fn has_work_available(&self) -> bool {
        !self.ready_ordered().is_empty() || !self.in_progress.is_empty()
    }

    pub fn progress(&self) -> SchedulerProgress {
        SchedulerProgress {
            total: self.tasks.len(),
            completed: self.completed.len(),
            in_progress: self.in_progress.len(),
            pending: self.tasks.len() - self.completed.len() - self.in_progress.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SchedulerProgress {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}
