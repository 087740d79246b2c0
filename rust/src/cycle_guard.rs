//! Cycle detection over accepted dependency edges.
//!
//! Advisory only: the scheduling passes never consult it and tolerate
//! cycles on their own. Callers that draw the network, or that want a
//! strictly consistent schedule, ask here first.

use pyo3::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::log_warn;
use crate::models::{DependencyEdge, Task};

/// Accepted edges: task id -> ids of the tasks it depends on.
pub type EdgeMap = FxHashMap<String, Vec<String>>;

/// Build the edge map from every task's dependency list.
pub fn build_edge_map(tasks: &[Task]) -> EdgeMap {
    let mut edges: EdgeMap = FxHashMap::with_capacity_and_hasher(tasks.len(), Default::default());
    for task in tasks {
        edges
            .entry(task.id.clone())
            .or_default()
            .extend(task.dependencies.iter().map(|dep| dep.target_id.clone()));
    }
    edges
}

/// Whether adding `source_id -> candidate_target_id` would close a cycle.
///
/// True when `candidate_target_id` already reaches `source_id`, or when the
/// two are the same task.
pub fn would_create_cycle(source_id: &str, candidate_target_id: &str, all_edges: &EdgeMap) -> bool {
    if source_id == candidate_target_id {
        return true;
    }

    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut stack: Vec<&str> = vec![candidate_target_id];

    while let Some(task_id) = stack.pop() {
        if !visited.insert(task_id) {
            continue;
        }
        let Some(targets) = all_edges.get(task_id) else {
            continue;
        };
        for target in targets {
            if target == source_id {
                return true;
            }
            if !visited.contains(target.as_str()) {
                stack.push(target);
            }
        }
    }

    false
}

/// An edge the guard refused because it would close a cycle.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleWarning {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub target_id: String,
}

#[pymethods]
impl CycleWarning {
    fn __repr__(&self) -> String {
        format!(
            "CycleWarning(task_id={:?}, target_id={:?})",
            self.task_id, self.target_id
        )
    }

    fn __str__(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dependency {} -> {} dropped: it would create a cycle",
            self.task_id, self.target_id
        )
    }
}

/// Result of filtering a task's proposed dependencies.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SafeEdges {
    #[pyo3(get)]
    pub accepted: Vec<DependencyEdge>,
    #[pyo3(get)]
    pub warnings: Vec<CycleWarning>,
}

#[pymethods]
impl SafeEdges {
    /// Ids of the accepted predecessors, in input order.
    pub fn target_ids(&self) -> Vec<String> {
        self.accepted.iter().map(|e| e.target_id.clone()).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "SafeEdges(accepted={}, warnings={})",
            self.accepted.len(),
            self.warnings.len()
        )
    }
}

/// Keep the edges of `task_id` that can be drawn without closing a cycle.
///
/// `raw_edges` replace whatever `task_id` currently depends on in
/// `all_tasks`. Edges to tasks that no longer exist are dropped silently;
/// cycle-closing edges are dropped with a warning.
pub fn filter_safe_edges(
    task_id: &str,
    raw_edges: &[DependencyEdge],
    all_tasks: &[Task],
    verbosity: u8,
) -> SafeEdges {
    let mut edges = build_edge_map(all_tasks);
    let known: FxHashSet<&str> = all_tasks.iter().map(|t| t.id.as_str()).collect();
    edges.insert(task_id.to_string(), Vec::with_capacity(raw_edges.len()));

    let mut result = SafeEdges::default();
    for edge in raw_edges {
        if !known.contains(edge.target_id.as_str()) {
            continue;
        }
        if would_create_cycle(task_id, &edge.target_id, &edges) {
            let warning = CycleWarning {
                task_id: task_id.to_string(),
                target_id: edge.target_id.clone(),
            };
            log_warn!(verbosity, "{}", warning);
            result.warnings.push(warning);
            continue;
        }
        if let Some(targets) = edges.get_mut(task_id) {
            targets.push(edge.target_id.clone());
        }
        result.accepted.push(edge.clone());
    }
    result
}

/// Ids of tasks that sit on a dependency cycle, in input order.
///
/// Empty exactly when the graph over known tasks is acyclic. Tasks that are
/// only downstream of a cycle are not listed.
pub fn find_cyclic_tasks(tasks: &[Task]) -> Vec<String> {
    let slots: FxHashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    // Edges run predecessor -> dependent.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    let mut in_degree = vec![0usize; tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.dependencies {
            if let Some(&pred) = slots.get(dep.target_id.as_str()) {
                dependents[pred].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..tasks.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut ordered = vec![false; tasks.len()];

    while let Some(i) = queue.pop_front() {
        ordered[i] = true;
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    // Whatever Kahn could not order is on a cycle or downstream of one; a
    // task is on a cycle when one of its predecessors reaches back to it.
    let edges = build_edge_map(tasks);
    tasks
        .iter()
        .zip(ordered)
        .filter(|(_, done)| !done)
        .filter(|(task, _)| {
            task.dependencies
                .iter()
                .any(|dep| would_create_cycle(&task.id, &dep.target_id, &edges))
        })
        .map(|(task, _)| task.id.clone())
        .collect()
}
