//! Forward pass: earliest start/finish by iterative relaxation.
//!
//! Each pass reads the previous pass's dates and writes a fresh buffer, so
//! the result does not depend on the order tasks are visited in.

use crate::models::Relation;
use crate::{log_debug, log_passes, log_warn};

use super::graph::ProjectGraph;
use super::types::{PassReport, Span};

/// Every task starting at the project anchor.
pub fn initial_state(graph: &ProjectGraph) -> Vec<Span> {
    graph
        .durations
        .iter()
        .map(|&duration| Span::starting_at(0, duration))
        .collect()
}

/// Earliest start of `idx` implied by its predecessors in `prev`.
fn candidate_start(graph: &ProjectGraph, idx: usize, prev: &[Span]) -> i64 {
    let links = &graph.predecessors[idx];
    if links.is_empty() {
        return graph.releases[idx];
    }

    let duration = graph.durations[idx];
    links
        .iter()
        .map(|link| {
            let pred = prev[link.task];
            // Finish-type relations constrain the successor's finish.
            let (bound, offset) = match link.relation {
                Relation::FinishToStart => (pred.finish, 0),
                Relation::StartToStart => (pred.start, 0),
                Relation::FinishToFinish => (pred.finish, duration),
                Relation::StartToFinish => (pred.start, duration),
            };
            bound.saturating_add(link.lag).saturating_sub(offset)
        })
        .fold(0, i64::max)
}

/// Run one relaxation pass. Returns the next state and whether any start moved.
pub fn relax(graph: &ProjectGraph, prev: &[Span], verbosity: u8) -> (Vec<Span>, bool) {
    let mut changed = false;
    let next = (0..graph.len())
        .map(|idx| {
            let start = candidate_start(graph, idx, prev);
            if start == prev[idx].start {
                return prev[idx];
            }
            log_debug!(
                verbosity,
                "  {}: earliest start {} -> {}",
                graph.name(idx),
                prev[idx].start,
                start
            );
            changed = true;
            Span::starting_at(start, graph.durations[idx])
        })
        .collect();
    (next, changed)
}

/// Relax until no start moves or `max_passes` passes have run.
///
/// Always returns a date for every task. If the cap is hit (a cycle, in
/// practice) the dates are whatever the last pass produced.
pub fn forward_pass(
    graph: &ProjectGraph,
    max_passes: usize,
    verbosity: u8,
) -> (Vec<Span>, PassReport) {
    let mut state = initial_state(graph);
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
            "Forward pass converged after {} passes",
            report.passes
        );
    } else {
        log_warn!(
            verbosity,
            "Forward pass stopped at {} passes without converging",
            report.passes
        );
    }
    (state, report)
}
