//! Dependency graph (spec §4.E): cycle detection, DAG level assignment,
//! ready-set computation, critical-path extraction. Hand-rolled DFS over
//! plain `Vec`/`HashMap`, in the style of the teacher's `graph::cycle`,
//! rather than a general-purpose graph crate — the tie-break and
//! level-assignment rules here are bespoke enough that a library buys us
//! nothing.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// An edge `task_id` depends on `depends_on_id`.
#[derive(Debug, Clone)]
pub struct Edge {
    pub task_id: String,
    pub depends_on_id: String,
}

/// The immutable, computed view of one plan's DAG (spec §4.E output).
#[derive(Debug, Clone)]
pub struct Graph {
    order: Vec<String>,
    level: HashMap<String, i32>,
    dependencies: HashMap<String, Vec<String>>,
    dependents: HashMap<String, Vec<String>>,
    by_level: HashMap<i32, Vec<String>>,
    max_level: i32,
}

impl Graph {
    /// Build a graph from a plan's task ids and dependency edges. Fails
    /// with [`Error::Cycle`] on a back-edge, without mutating anything —
    /// the caller treats a build failure as a pure domain error (spec
    /// §4.E "Error semantics").
    pub fn build(task_ids: &[String], edges: &[Edge]) -> Result<Self> {
        validate_edges(task_ids, edges)?;

        let mut dependencies: HashMap<String, Vec<String>> =
            task_ids.iter().map(|id| (id.clone(), Vec::new())).collect();
        let mut dependents: HashMap<String, Vec<String>> =
            task_ids.iter().map(|id| (id.clone(), Vec::new())).collect();
        for edge in edges {
            dependencies.entry(edge.task_id.clone()).or_default().push(edge.depends_on_id.clone());
            dependents.entry(edge.depends_on_id.clone()).or_default().push(edge.task_id.clone());
        }

        let mut level: HashMap<String, i32> = HashMap::new();
        let mut visited: HashSet<String> = HashSet::new();

        for id in task_ids {
            if !visited.contains(id) {
                let mut visiting: HashSet<String> = HashSet::new();
                assign_levels(id, &dependencies, &mut visited, &mut visiting, &mut level)?;
            }
        }

        let max_level = level.values().copied().max().unwrap_or(0);
        let mut by_level: HashMap<i32, Vec<String>> = HashMap::new();
        for id in task_ids {
            by_level.entry(level[id]).or_default().push(id.clone());
        }

        Ok(Self {
            order: task_ids.to_vec(),
            level,
            dependencies,
            dependents,
            by_level,
            max_level,
        })
    }

    pub fn level(&self, task_id: &str) -> Option<i32> {
        self.level.get(task_id).copied()
    }

    pub fn dependencies(&self, task_id: &str) -> &[String] {
        self.dependencies.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents(&self, task_id: &str) -> &[String] {
        self.dependents.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    pub fn tasks_at_level(&self, level: i32) -> &[String] {
        self.by_level.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The ready set (spec §4.E, algorithm 2): tasks whose status is
    /// `pending`/`ready` (caller filters by that — this function only
    /// needs ids plus a `completed` predicate) and whose every
    /// dependency is in `completed`. Pure and idempotent.
    pub fn ready_set<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a str>,
        completed: &HashSet<String>,
    ) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|id| self.dependencies(id).iter().all(|dep| completed.contains(dep)))
            .map(str::to_string)
            .collect()
    }

    /// Critical path (spec §4.E, algorithm 3): from any task at
    /// `max_level`, recursively follow the dependency with the highest
    /// level, tie-broken by first-seen (insertion) order. Returns the
    /// path root-to-leaf (i.e. reversed from the walk direction).
    pub fn critical_path(&self) -> Vec<String> {
        let start = self
            .order
            .iter()
            .find(|id| self.level[*id] == self.max_level);
        let Some(start) = start else { return Vec::new() };

        let mut path = vec![start.clone()];
        let mut current = start.clone();
        loop {
            let deps = self.dependencies(&current);
            if deps.is_empty() {
                break;
            }
            let mut best: Option<&String> = None;
            let mut best_level = i32::MIN;
            for dep in deps {
                let dep_level = self.level[dep];
                if dep_level > best_level {
                    best_level = dep_level;
                    best = Some(dep);
                }
            }
            let Some(next) = best else { break };
            path.push(next.clone());
            current = next.clone();
        }
        path.reverse();
        path
    }
}

fn assign_levels(
    node: &str,
    dependencies: &HashMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
    visiting: &mut HashSet<String>,
    level: &mut HashMap<String, i32>,
) -> Result<i32> {
    if let Some(&l) = level.get(node) {
        return Ok(l);
    }
    if visiting.contains(node) {
        return Err(Error::cycle(node));
    }
    visiting.insert(node.to_string());

    let deps = dependencies.get(node).cloned().unwrap_or_default();
    let mut computed = 0;
    if !deps.is_empty() {
        let mut max_dep_level = -1;
        for dep in &deps {
            let dep_level = assign_levels(dep, dependencies, visited, visiting, level)?;
            max_dep_level = max_dep_level.max(dep_level);
        }
        computed = 1 + max_dep_level;
    }

    visiting.remove(node);
    visited.insert(node.to_string());
    level.insert(node.to_string(), computed);
    Ok(computed)
}

/// Validation (spec §4.E, algorithm 4) for externally-supplied edge sets:
/// every endpoint exists, no self-edge, no duplicate.
fn validate_edges(task_ids: &[String], edges: &[Edge]) -> Result<()> {
    let known: HashSet<&str> = task_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for edge in edges {
        if !known.contains(edge.task_id.as_str()) {
            return Err(Error::not_found("task", &edge.task_id));
        }
        if !known.contains(edge.depends_on_id.as_str()) {
            return Err(Error::not_found("task", &edge.depends_on_id));
        }
        if edge.task_id == edge.depends_on_id {
            return Err(Error::cycle(&edge.task_id));
        }
        let key = (edge.task_id.as_str(), edge.depends_on_id.as_str());
        if !seen.insert(key) {
            return Err(Error::already_exists("task_dependency", format!("{}->{}", edge.task_id, edge.depends_on_id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str) -> Edge {
        Edge { task_id: a.to_string(), depends_on_id: b.to_string() }
    }

    #[test]
    fn single_task_has_level_zero() {
        let ids = vec!["a".to_string()];
        let graph = Graph::build(&ids, &[]).unwrap();
        assert_eq!(graph.level("a"), Some(0));
        assert_eq!(graph.max_level(), 0);
    }

    #[test]
    fn linear_chain_levels_increase() {
        let ids: Vec<String> = vec!["a", "b", "c"].into_iter().map(String::from).collect();
        let edges = vec![edge("b", "a"), edge("c", "b")];
        let graph = Graph::build(&ids, &edges).unwrap();
        assert_eq!(graph.level("a"), Some(0));
        assert_eq!(graph.level("b"), Some(1));
        assert_eq!(graph.level("c"), Some(2));
        assert_eq!(graph.critical_path(), vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_shape_levels() {
        let ids: Vec<String> = vec!["a", "b", "c", "d"].into_iter().map(String::from).collect();
        let edges = vec![edge("b", "a"), edge("c", "a"), edge("d", "b"), edge("d", "c")];
        let graph = Graph::build(&ids, &edges).unwrap();
        assert_eq!(graph.level("a"), Some(0));
        assert_eq!(graph.level("b"), Some(1));
        assert_eq!(graph.level("c"), Some(1));
        assert_eq!(graph.level("d"), Some(2));

        let mut completed = HashSet::new();
        let ready = graph.ready_set(["b", "c"], &completed);
        assert!(ready.is_empty());
        completed.insert("a".to_string());
        let mut ready = graph.ready_set(["b", "c"], &completed);
        ready.sort();
        assert_eq!(ready, vec!["b", "c"]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let ids = vec!["a".to_string()];
        let edges = vec![edge("a", "a")];
        assert!(matches!(Graph::build(&ids, &edges), Err(Error::Cycle { .. })));
    }

    #[test]
    fn three_cycle_is_rejected() {
        let ids: Vec<String> = vec!["a", "b", "c"].into_iter().map(String::from).collect();
        let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        assert!(matches!(Graph::build(&ids, &edges), Err(Error::Cycle { .. })));
    }

    #[test]
    fn duplicate_edge_is_rejected() {
        let ids: Vec<String> = vec!["a", "b"].into_iter().map(String::from).collect();
        let edges = vec![edge("a", "b"), edge("a", "b")];
        assert!(Graph::build(&ids, &edges).is_err());
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let ids = vec!["a".to_string()];
        let edges = vec![edge("a", "ghost")];
        assert!(matches!(Graph::build(&ids, &edges), Err(Error::NotFound { .. })));
    }
}
