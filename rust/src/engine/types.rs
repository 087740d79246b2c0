//! Types shared by the relaxation passes.
//!
//! All dates here are signed day offsets from the project anchor.

use pyo3::prelude::*;

/// A start/finish pair that always satisfies `finish = start + duration`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: i64,
    pub finish: i64,
}

impl Span {
    pub fn starting_at(start: i64, duration: i64) -> Self {
        Self {
            start,
            finish: start.saturating_add(duration),
        }
    }

    pub fn finishing_at(finish: i64, duration: i64) -> Self {
        Self {
            start: finish.saturating_sub(duration),
            finish,
        }
    }
}

/// Per-task timing once both passes have run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    /// Earliest start/finish (from forward pass).
    pub earliest: Span,
    /// Latest start/finish (from backward pass).
    pub latest: Span,
    /// Slack = latest start - earliest start.
    pub slack: i64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.slack <= 0
    }
}

/// How a relaxation pass ended.
///
/// `converged == false` means the pass hit its iteration cap and the dates
/// it produced may not satisfy every constraint.
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Passes executed, including the final pass that saw no change.
    #[pyo3(get)]
    pub passes: usize,
    #[pyo3(get)]
    pub converged: bool,
}

#[pymethods]
impl PassReport {
    fn __repr__(&self) -> String {
        format!(
            "PassReport(passes={}, converged={})",
            self.passes, self.converged
        )
    }
}
