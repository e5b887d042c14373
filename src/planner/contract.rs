//! Planner contract (spec §4.G): input/output shapes and validation,
//! independent of which backend produced the response.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct PlannerInput {
    pub prompt: String,
    pub project_digest: Option<String>,
    pub context_snippets: Vec<String>,
    pub max_lines_per_task: Option<i32>,
}

/// One task as returned by the planner, before identity translation.
/// `id` is an opaque token local to the response, used only to resolve
/// `depends_on` — the store assigns the real identity at persistence time.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlannedTask {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_lines: Option<i32>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlannerResponse {
    pub tasks: Vec<RawPlannedTask>,
    #[serde(default)]
    pub summary: String,
}

/// A validated planned task: safe defaults applied, self-references
/// dropped, duplicate `depends_on` collapsed.
#[derive(Debug, Clone)]
pub struct PlannedTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub estimated_lines: i32,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PlannerOutput {
    pub tasks: Vec<PlannedTask>,
    pub summary: String,
}

const DEFAULT_ESTIMATED_LINES: i32 = 50;

/// Validate a raw planner response per spec §4.G: auto-assign empty ids,
/// default missing fields, drop self-edges, collapse duplicate edges,
/// and require every `depends_on` target to be present in the response.
pub fn validate(raw: RawPlannerResponse) -> Result<PlannerOutput> {
    if raw.tasks.is_empty() {
        return Err(Error::Invalid("planner response contained no tasks".into()));
    }

    let mut tasks = Vec::with_capacity(raw.tasks.len());
    for (i, t) in raw.tasks.into_iter().enumerate() {
        let id = if t.id.trim().is_empty() { format!("task_{:03}", i + 1) } else { t.id };
        let title = t.title;
        let description = t.description.filter(|d| !d.trim().is_empty()).unwrap_or_else(|| title.clone());
        let estimated_lines = t.estimated_lines.unwrap_or(DEFAULT_ESTIMATED_LINES);

        let mut seen = HashSet::new();
        let depends_on: Vec<String> = t
            .depends_on
            .into_iter()
            .filter(|dep| dep != &id)
            .filter(|dep| seen.insert(dep.clone()))
            .collect();

        tasks.push(PlannedTask { id, title, description, estimated_lines, depends_on });
    }

    let known: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    for task in &tasks {
        for dep in &task.depends_on {
            if !known.contains(dep.as_str()) {
                return Err(Error::Invalid(format!(
                    "planner response references unknown depends_on target '{dep}' from task '{}'",
                    task.id
                )));
            }
        }
    }

    Ok(PlannerOutput { tasks, summary: raw.summary })
}

/// Translation map from the planner's opaque ids to store identities,
/// built during persistence (spec §4.G: "the scheduler/store assigns the
/// final identities... and maintains a translation map").
pub type IdTranslation = HashMap<String, String>;

/// The planner is an opaque external collaborator behind a trait so the
/// HTTP-backed implementation and a scripted test double share one
/// contract.
pub trait Planner {
    fn plan(&self, input: &PlannerInput) -> Result<PlannerOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ids_are_auto_assigned() {
        let raw = RawPlannerResponse {
            tasks: vec![
                RawPlannedTask { id: String::new(), title: "a".into(), description: None, estimated_lines: None, depends_on: vec![] },
                RawPlannedTask { id: String::new(), title: "b".into(), description: None, estimated_lines: None, depends_on: vec![] },
            ],
            summary: "s".into(),
        };
        let out = validate(raw).unwrap();
        assert_eq!(out.tasks[0].id, "task_001");
        assert_eq!(out.tasks[1].id, "task_002");
    }

    #[test]
    fn self_reference_is_dropped() {
        let raw = RawPlannerResponse {
            tasks: vec![RawPlannedTask {
                id: "t1".into(),
                title: "a".into(),
                description: None,
                estimated_lines: None,
                depends_on: vec!["t1".into()],
            }],
            summary: String::new(),
        };
        let out = validate(raw).unwrap();
        assert!(out.tasks[0].depends_on.is_empty());
    }

    #[test]
    fn unknown_dependency_target_is_rejected() {
        let raw = RawPlannerResponse {
            tasks: vec![RawPlannedTask {
                id: "t1".into(),
                title: "a".into(),
                description: None,
                estimated_lines: None,
                depends_on: vec!["ghost".into()],
            }],
            summary: String::new(),
        };
        assert!(validate(raw).is_err());
    }

    #[test]
    fn missing_fields_default_to_safe_values() {
        let raw = RawPlannerResponse {
            tasks: vec![RawPlannedTask {
                id: "t1".into(),
                title: "do the thing".into(),
                description: None,
                estimated_lines: None,
                depends_on: vec![],
            }],
            summary: String::new(),
        };
        let out = validate(raw).unwrap();
        assert_eq!(out.tasks[0].description, "do the thing");
        assert_eq!(out.tasks[0].estimated_lines, DEFAULT_ESTIMATED_LINES);
    }
}
