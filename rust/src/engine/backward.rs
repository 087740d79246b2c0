//! Backward pass: latest start/finish by mirror relaxation.
//!
//! Seeded from the project end computed by the forward pass. Bounds only
//! ever tighten a task's latest dates, and every update keeps
//! `latest_start = latest_finish - duration`.

use crate::models::Relation;
use crate::{log_debug, log_passes, log_warn};

use super::graph::ProjectGraph;
use super::types::{PassReport, Span};

/// Latest finish over all earliest schedules, or the anchor for an empty project.
pub fn project_end(earliest: &[Span]) -> i64 {
    earliest.iter().map(|s| s.finish).max().unwrap_or(0)
}

/// Every task finishing at the project end.
pub fn initial_state(graph: &ProjectGraph, project_end: i64) -> Vec<Span> {
    graph
        .durations
        .iter()
        .map(|&duration| Span::finishing_at(project_end, duration))
        .collect()
}

/// Latest finish of `idx` allowed by its dependents in `prev`.
///
/// Start bounds are turned into finish bounds through the task's duration,
/// so whichever of the two is tighter wins.
fn tightened_finish(graph: &ProjectGraph, idx: usize, prev: &[Span]) -> i64 {
    let duration = graph.durations[idx];
    graph.successors[idx]
        .iter()
        .map(|link| {
            let succ = prev[link.task];
            let (bound, offset) = match link.relation {
                Relation::FinishToStart => (succ.start, 0),
                Relation::StartToStart => (succ.start, duration),
                Relation::FinishToFinish => (succ.finish, 0),
                Relation::StartToFinish => (succ.finish, duration),
            };
            bound.saturating_sub(link.lag).saturating_add(offset)
        })
        .fold(prev[idx].finish, i64::min)
}

/// Run one relaxation pass. Returns the next state and whether any latest finish moved.
pub fn relax(graph: &ProjectGraph, prev: &[Span], verbosity: u8) -> (Vec<Span>, bool) {
    let mut changed = false;
    let next = (0..graph.len())
        .map(|idx| {
            let finish = tightened_finish(graph, idx, prev);
            if finish == prev[idx].finish {
                return prev[idx];
            }
            log_debug!(
                verbosity,
                "  {}: latest finish {} -> {}",
                graph.name(idx),
                prev[idx].finish,
                finish
            );
            changed = true;
            Span::finishing_at(finish, graph.durations[idx])
        })
        .collect();
    (next, changed)
}

/// Relax until no latest finish moves or `max_passes` passes have run.
pub fn backward_pass(
    graph: &ProjectGraph,
    project_end: i64,
    max_passes: usize,
    verbosity: u8,
) -> (Vec<Span>, PassReport) {
    let mut state = initial_state(graph, project_end);
    let mut report = PassReport::default();

    while report.passes < max_passes {
        report.passes += 1;
        let (next, changed) = relax(graph, &state, verbosity);
        state = next;
        if !changed {
            report.converged = true;
            break;
        }
    }

    if report.converged {
        log_passes!(
            verbosity,
            "Backward pass converged after {} passes",
            report.passes
        );
    } else {
        log_warn!(
            verbosity,
            "Backward pass stopped at {} passes without converging",
            report.passes
        );
    }
    (state, report)
}
