//! Core data types for the scheduling engine.

use chrono::NaiveDate;
use pyo3::prelude::*;
use std::fmt;

/// Precedence semantics between a predecessor and its successor.
///
/// The short codes follow the boundary notation: `FC` (finish/commence),
/// `CC`, `FF` and `CF`.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Relation {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::FinishToStart,
        Relation::StartToStart,
        Relation::FinishToFinish,
        Relation::StartToFinish,
    ];

    /// Two-letter boundary code, upper-case.
    pub fn code(self) -> &'static str {
        match self {
            Relation::FinishToStart => "FC",
            Relation::StartToStart => "CC",
            Relation::FinishToFinish => "FF",
            Relation::StartToFinish => "CF",
        }
    }

    /// Look up a relation by its two-letter code, ignoring case.
    pub fn from_code(code: &str) -> Option<Relation> {
        Relation::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A precedence edge pointing at the predecessor `target_id`.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyEdge {
    #[pyo3(get, set)]
    pub target_id: String,
    #[pyo3(get, set)]
    pub relation: Relation,
    /// Signed day offset; negative values are leads.
    #[pyo3(get, set)]
    pub lag_days: i64,
}

#[pymethods]
impl DependencyEdge {
    #[new]
    #[pyo3(signature = (target_id, relation=Relation::FinishToStart, lag_days=0))]
    pub fn new(target_id: String, relation: Relation, lag_days: i64) -> Self {
        Self {
            target_id,
            relation,
            lag_days,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "DependencyEdge(target_id={:?}, relation={}, lag_days={})",
            self.target_id, self.relation, self.lag_days
        )
    }
}

impl DependencyEdge {
    /// Plain finish-to-start edge with no lag (the legacy bare-id meaning).
    pub fn finish_to_start(target_id: impl Into<String>) -> Self {
        Self::new(target_id.into(), Relation::FinishToStart, 0)
    }
}

/// A task to be scheduled, together with its computed schedule fields.
///
/// The computed fields are `None` until the task has been through a
/// scheduling run.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    #[pyo3(get, set)]
    pub id: String,
    /// Whole days, at least 1.
    #[pyo3(get, set)]
    pub duration_days: i64,
    #[pyo3(get, set)]
    pub dependencies: Vec<DependencyEdge>,
    /// "No earlier than" date, honored only when the task has no valid dependencies.
    #[pyo3(get, set)]
    pub anchor_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub earliest_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub earliest_finish: Option<NaiveDate>,
    #[pyo3(get)]
    pub latest_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub latest_finish: Option<NaiveDate>,
    #[pyo3(get)]
    pub slack: Option<i64>,
    #[pyo3(get)]
    pub is_critical: bool,
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (id, duration_days, dependencies=Vec::new(), anchor_start=None))]
    pub fn new(
        id: String,
        duration_days: i64,
        dependencies: Vec<DependencyEdge>,
        anchor_start: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            duration_days,
            dependencies,
            anchor_start,
            earliest_start: None,
            earliest_finish: None,
            latest_start: None,
            latest_finish: None,
            slack: None,
            is_critical: false,
        }
    }

    /// Whether both schedules have been written onto this task.
    pub fn is_scheduled(&self) -> bool {
        self.earliest_start.is_some() && self.latest_start.is_some()
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, duration_days={}, deps={}, es={:?}, ls={:?}, critical={})",
            self.id,
            self.duration_days,
            self.dependencies.len(),
            self.earliest_start,
            self.latest_start,
            self.is_critical
        )
    }
}

impl Task {
    /// Drop every computed field, leaving only the inputs.
    pub fn clear_schedule(&mut self) {
        self.earliest_start = None;
        self.earliest_finish = None;
        self.latest_start = None;
        self.latest_finish = None;
        self.slack = None;
        self.is_critical = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_codes_case_insensitive() {
        assert_eq!(Relation::from_code("fc"), Some(Relation::FinishToStart));
        assert_eq!(Relation::from_code("Cc"), Some(Relation::StartToStart));
        assert_eq!(Relation::from_code("FF"), Some(Relation::FinishToFinish));
        assert_eq!(Relation::from_code("cf"), Some(Relation::StartToFinish));
        assert_eq!(Relation::from_code("SS"), None);
    }

    #[test]
    fn test_relation_default_is_finish_to_start() {
        assert_eq!(Relation::default(), Relation::FinishToStart);
        assert_eq!(Relation::default().to_string(), "FC");
    }

    #[test]
    fn test_new_task_is_unscheduled() {
        let mut task = Task::new(
            "a".to_string(),
            3,
            vec![DependencyEdge::finish_to_start("b")],
            None,
        );
        assert!(!task.is_scheduled());

        task.earliest_start = NaiveDate::from_ymd_opt(2025, 1, 1);
        task.latest_start = NaiveDate::from_ymd_opt(2025, 1, 1);
        task.is_critical = true;
        assert!(task.is_scheduled());

        task.clear_schedule();
        assert!(!task.is_scheduled());
        assert!(!task.is_critical);
    }
}
