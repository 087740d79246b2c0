//! Critical path scheduling engine.
//!
//! Computes earliest/latest dates, slack and critical flags for a task set
//! with typed precedence edges, and reads/writes the compact dependency
//! notation used by the surrounding application.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDate;
use pyo3::prelude::*;

pub mod codec;
mod config;
pub mod cycle_guard;
pub mod engine;
pub mod logging;
mod models;
pub mod ordering;

pub use codec::{
    format_canonical, format_dependency_list, format_edge, parse_canonical,
    parse_dependency_list, parse_edge, CodecError,
};
pub use config::{EngineConfig, MAX_PASSES};
pub use cycle_guard::{
    build_edge_map, filter_safe_edges, find_cyclic_tasks, would_create_cycle, CycleWarning,
    EdgeMap, SafeEdges,
};
pub use engine::{schedule, EngineError, PassReport, ScheduleOutcome};
pub use models::{DependencyEdge, Relation, Task};
pub use ordering::{ReferenceIndexer, ReferenceResolver, TaskOrdering};

/// Schedule a task set.
///
/// # Arguments
/// * `tasks` - Tasks in display order
/// * `project_anchor` - Earliest start for tasks with no dependencies
/// * `config` - Engine configuration (defaults if omitted)
///
/// # Returns
/// * ScheduleOutcome with every task's dates, slack and critical flag
///
/// # Raises
/// * ValueError on duplicate ids, durations below one day, self
///   dependencies, or (with `reject_cycles`) a cyclic graph
#[pyfunction]
#[pyo3(name = "schedule_project", signature = (tasks, project_anchor, config=None))]
fn py_schedule_project(
    tasks: Vec<Task>,
    project_anchor: NaiveDate,
    config: Option<EngineConfig>,
) -> PyResult<ScheduleOutcome> {
    let config = config.unwrap_or_default();
    schedule(tasks, project_anchor, &config)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Parse a dependency cell such as `"1, 3FC+2"` for the task `editing_task_id`.
///
/// Positions refer to `ordered_task_ids` (1-based).
///
/// # Raises
/// * ValueError on a malformed token, an out-of-range row, or a self reference
#[pyfunction]
#[pyo3(name = "parse_dependencies")]
fn py_parse_dependencies(
    cell: &str,
    editing_task_id: &str,
    ordered_task_ids: Vec<String>,
) -> PyResult<Vec<DependencyEdge>> {
    let ordering = TaskOrdering::from_ids(&ordered_task_ids);
    parse_dependency_list(cell, editing_task_id, &ordering)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Render edges as a dependency cell against the current display order.
#[pyfunction]
#[pyo3(name = "format_dependencies")]
fn py_format_dependencies(edges: Vec<DependencyEdge>, ordered_task_ids: Vec<String>) -> String {
    let ordering = TaskOrdering::from_ids(&ordered_task_ids);
    format_dependency_list(&edges, &ordering)
}

/// Parse a stored edge (`"<id>:<code>:<lag>"` or a bare id).
#[pyfunction]
#[pyo3(name = "parse_canonical_edge")]
fn py_parse_canonical_edge(s: &str) -> PyResult<DependencyEdge> {
    parse_canonical(s).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Render an edge in its stored form.
#[pyfunction]
#[pyo3(name = "format_canonical_edge")]
fn py_format_canonical_edge(edge: DependencyEdge) -> String {
    format_canonical(&edge)
}

/// Whether `source_id` depending on `candidate_target_id` would close a cycle.
#[pyfunction]
#[pyo3(name = "would_create_cycle")]
fn py_would_create_cycle(source_id: &str, candidate_target_id: &str, tasks: Vec<Task>) -> bool {
    would_create_cycle(source_id, candidate_target_id, &build_edge_map(&tasks))
}

/// Keep the proposed edges of `task_id` that do not close a cycle.
#[pyfunction]
#[pyo3(name = "filter_safe_edges", signature = (task_id, raw_edges, all_tasks, verbosity=0))]
fn py_filter_safe_edges(
    task_id: &str,
    raw_edges: Vec<DependencyEdge>,
    all_tasks: Vec<Task>,
    verbosity: u8,
) -> SafeEdges {
    filter_safe_edges(task_id, &raw_edges, &all_tasks, verbosity)
}

/// The critpath.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Relation>()?;
    m.add_class::<DependencyEdge>()?;
    m.add_class::<Task>()?;
    m.add_class::<PassReport>()?;
    m.add_class::<ScheduleOutcome>()?;
    m.add_class::<CycleWarning>()?;
    m.add_class::<SafeEdges>()?;

    // Config types
    m.add_class::<EngineConfig>()?;
    m.add("MAX_PASSES", MAX_PASSES)?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_schedule_project, m)?)?;
    m.add_function(wrap_pyfunction!(py_would_create_cycle, m)?)?;
    m.add_function(wrap_pyfunction!(py_filter_safe_edges, m)?)?;

    // Notation
    m.add_function(wrap_pyfunction!(py_parse_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(py_format_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(py_parse_canonical_edge, m)?)?;
    m.add_function(wrap_pyfunction!(py_format_canonical_edge, m)?)?;

    Ok(())
}
