//! Critical path scheduling engine.
//!
//! A run validates the task set, builds an indexed graph, relaxes earliest
//! dates forward, relaxes latest dates backward from the project end, and
//! derives slack and critical flags. The passes tolerate cyclic input: they
//! stop at the configured cap and report that they did not converge rather
//! than failing.

mod analysis;
mod backward;
mod forward;
mod graph;
mod types;

use chrono::NaiveDate;
use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::cycle_guard::find_cyclic_tasks;
use crate::log_passes;
use crate::models::Task;

pub use analysis::analyze;
pub use backward::{backward_pass, project_end};
pub use forward::forward_pass;
pub use graph::{date_at, day_offset, Link, ProjectGraph};
pub use types::{PassReport, Span, TaskTiming};

/// Errors that stop a run before any pass starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),
    #[error("Task {task_id} has duration {duration_days}; durations must be at least 1 day")]
    InvalidDuration { task_id: String, duration_days: i64 },
    #[error("Task {0} depends on itself")]
    SelfDependency(String),
    #[error("Circular dependency detected among tasks: {0:?}")]
    CircularDependency(Vec<String>),
}

/// The scheduled task set returned by a run.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleOutcome {
    /// Input tasks, in input order, with every computed field written.
    #[pyo3(get)]
    pub tasks: Vec<Task>,
    #[pyo3(get)]
    pub project_anchor: NaiveDate,
    /// Latest earliest-finish over all tasks.
    #[pyo3(get)]
    pub project_end: NaiveDate,
    #[pyo3(get)]
    pub forward: PassReport,
    #[pyo3(get)]
    pub backward: PassReport,
}

#[pymethods]
impl ScheduleOutcome {
    /// Whether both passes reached a fixed point.
    pub fn is_consistent(&self) -> bool {
        self.forward.converged && self.backward.converged
    }

    /// Ids of critical tasks, in input order.
    pub fn critical_task_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.is_critical)
            .map(|t| t.id.clone())
            .collect()
    }

    /// `(id, is_critical)` for every task, the only field persisted back.
    pub fn critical_flags(&self) -> Vec<(String, bool)> {
        self.tasks
            .iter()
            .map(|t| (t.id.clone(), t.is_critical))
            .collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleOutcome(tasks={}, project_end={}, consistent={})",
            self.tasks.len(),
            self.project_end,
            self.is_consistent()
        )
    }
}

/// Check the structural preconditions of a run.
pub fn validate(tasks: &[Task]) -> Result<(), EngineError> {
    let mut seen: FxHashSet<&str> =
        FxHashSet::with_capacity_and_hasher(tasks.len(), Default::default());
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(EngineError::DuplicateTaskId(task.id.clone()));
        }
        if task.duration_days < 1 {
            return Err(EngineError::InvalidDuration {
                task_id: task.id.clone(),
                duration_days: task.duration_days,
            });
        }
        if task.dependencies.iter().any(|d| d.target_id == task.id) {
            return Err(EngineError::SelfDependency(task.id.clone()));
        }
    }
    Ok(())
}

/// Schedule a task set from an explicit project anchor date.
///
/// # Returns
/// * `Ok(ScheduleOutcome)` with every task's dates, slack and critical flag
///   filled in. Check `is_consistent()` when the input may contain cycles.
/// * `Err(EngineError)` if validation fails, or if `config.reject_cycles` is
///   set and the graph has a cycle.
pub fn schedule(
    mut tasks: Vec<Task>,
    project_anchor: NaiveDate,
    config: &EngineConfig,
) -> Result<ScheduleOutcome, EngineError> {
    validate(&tasks)?;
    if config.reject_cycles {
        let cyclic = find_cyclic_tasks(&tasks);
        if !cyclic.is_empty() {
            return Err(EngineError::CircularDependency(cyclic));
        }
    }

    let verbosity = config.verbosity;
    let graph = ProjectGraph::new(&tasks, project_anchor, verbosity);

    let (earliest, forward) = forward_pass(&graph, config.max_passes, verbosity);
    let end = project_end(&earliest);
    log_passes!(
        verbosity,
        "Project end: {} ({} days after anchor)",
        date_at(project_anchor, end),
        end
    );
    let (latest, backward) = backward_pass(&graph, end, config.max_passes, verbosity);

    // Slots follow input order once ids are known to be unique.
    for (task, timing) in tasks.iter_mut().zip(analyze(&earliest, &latest)) {
        write_timing(task, &timing, project_anchor);
    }

    Ok(ScheduleOutcome {
        tasks,
        project_anchor,
        project_end: date_at(project_anchor, end),
        forward,
        backward,
    })
}

fn write_timing(task: &mut Task, timing: &TaskTiming, anchor: NaiveDate) {
    task.earliest_start = Some(date_at(anchor, timing.earliest.start));
    task.earliest_finish = Some(date_at(anchor, timing.earliest.finish));
    task.latest_start = Some(date_at(anchor, timing.latest.start));
    task.latest_finish = Some(date_at(anchor, timing.latest.finish));
    task.slack = Some(timing.slack);
    task.is_critical = timing.is_critical();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyEdge, Relation};

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn day(n: i64) -> NaiveDate {
        date_at(anchor(), n)
    }

    fn make_task(id: &str, duration: i64, deps: Vec<(&str, Relation, i64)>) -> Task {
        Task::new(
            id.to_string(),
            duration,
            deps.into_iter()
                .map(|(dep_id, relation, lag)| {
                    DependencyEdge::new(dep_id.to_string(), relation, lag)
                })
                .collect(),
            None,
        )
    }

    fn run(tasks: Vec<Task>) -> ScheduleOutcome {
        schedule(tasks, anchor(), &EngineConfig::default()).unwrap()
    }

    fn find<'a>(outcome: &'a ScheduleOutcome, id: &str) -> &'a Task {
        outcome.tasks.iter().find(|t| t.id == id).unwrap()
    }

    #[test]
    fn test_simple_chain() {
        let outcome = run(vec![
            make_task("a", 5, vec![]),
            make_task("b", 3, vec![("a", Relation::FinishToStart, 2)]),
            make_task("c", 4, vec![("b", Relation::StartToStart, 0)]),
        ]);

        let a = find(&outcome, "a");
        assert_eq!(a.earliest_start, Some(day(0)));
        assert_eq!(a.earliest_finish, Some(day(5)));
        let b = find(&outcome, "b");
        assert_eq!(b.earliest_start, Some(day(7)));
        assert_eq!(b.earliest_finish, Some(day(10)));
        let c = find(&outcome, "c");
        assert_eq!(c.earliest_start, Some(day(7)));
        assert_eq!(c.earliest_finish, Some(day(11)));

        assert_eq!(outcome.project_end, day(11));
        for task in &outcome.tasks {
            assert_eq!(task.slack, Some(0), "task {}", task.id);
            assert!(task.is_critical);
        }
        assert!(outcome.is_consistent());
    }

    #[test]
    fn test_lag_with_slack() {
        let outcome = run(vec![
            make_task("a", 5, vec![]),
            make_task("b", 3, vec![("a", Relation::FinishToStart, 0)]),
            make_task("c", 20, vec![]),
        ]);

        assert_eq!(outcome.project_end, day(20));

        let b = find(&outcome, "b");
        assert_eq!(b.earliest_start, Some(day(5)));
        assert_eq!(b.latest_finish, Some(day(20)));
        assert_eq!(b.latest_start, Some(day(17)));
        assert_eq!(b.slack, Some(12));
        assert!(!b.is_critical);

        let a = find(&outcome, "a");
        assert_eq!(a.slack, Some(12));

        let c = find(&outcome, "c");
        assert_eq!(c.slack, Some(0));
        assert!(c.is_critical);
        assert_eq!(outcome.critical_task_ids(), vec!["c".to_string()]);
    }

    #[test]
    fn test_diamond() {
        // Path via c is longest: a(2) -> c(5) -> d(1)
        let outcome = run(vec![
            make_task("a", 2, vec![]),
            make_task("b", 3, vec![("a", Relation::FinishToStart, 0)]),
            make_task("c", 5, vec![("a", Relation::FinishToStart, 0)]),
            make_task(
                "d",
                1,
                vec![
                    ("b", Relation::FinishToStart, 0),
                    ("c", Relation::FinishToStart, 0),
                ],
            ),
        ]);

        assert_eq!(outcome.project_end, day(8));
        assert_eq!(
            outcome.critical_task_ids(),
            vec!["a".to_string(), "c".to_string(), "d".to_string()]
        );
        assert_eq!(find(&outcome, "b").slack, Some(2));
    }

    #[test]
    fn test_duration_floor_and_critical_split() {
        let outcome = run(vec![
            make_task("a", 4, vec![]),
            make_task("b", 2, vec![("a", Relation::StartToStart, 1)]),
            make_task("c", 6, vec![("a", Relation::FinishToFinish, 3)]),
            make_task("d", 3, vec![("b", Relation::StartToFinish, 2)]),
            make_task(
                "e",
                1,
                vec![
                    ("c", Relation::FinishToStart, -2),
                    ("d", Relation::FinishToStart, 0),
                ],
            ),
        ]);
        assert!(outcome.is_consistent());

        for task in &outcome.tasks {
            let es = task.earliest_start.unwrap();
            let ef = task.earliest_finish.unwrap();
            let ls = task.latest_start.unwrap();
            let lf = task.latest_finish.unwrap();
            assert_eq!(day_offset(es, ef), task.duration_days);
            assert_eq!(day_offset(ls, lf), task.duration_days);
            assert_eq!(task.slack, Some(day_offset(es, ls)));
            assert_eq!(task.is_critical, task.slack.unwrap() <= 0);
        }
    }

    #[test]
    fn test_constraints_hold_after_convergence() {
        let tasks = vec![
            make_task("a", 3, vec![]),
            make_task("b", 2, vec![("a", Relation::FinishToStart, 1)]),
            make_task(
                "c",
                4,
                vec![
                    ("a", Relation::StartToStart, 2),
                    ("b", Relation::FinishToFinish, 0),
                ],
            ),
            make_task("d", 5, vec![("c", Relation::StartToFinish, 3)]),
        ];
        let outcome = run(tasks);

        for task in &outcome.tasks {
            for dep in &task.dependencies {
                let pred = find(&outcome, &dep.target_id);
                let (pes, pef) = (pred.earliest_start.unwrap(), pred.earliest_finish.unwrap());
                let (ses, sef) = (task.earliest_start.unwrap(), task.earliest_finish.unwrap());
                let ok = match dep.relation {
                    Relation::FinishToStart => day_offset(pef, ses) >= dep.lag_days,
                    Relation::StartToStart => day_offset(pes, ses) >= dep.lag_days,
                    Relation::FinishToFinish => day_offset(pef, sef) >= dep.lag_days,
                    Relation::StartToFinish => day_offset(pes, sef) >= dep.lag_days,
                };
                assert!(ok, "{} -> {} violated", task.id, dep.target_id);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let tasks = vec![
            make_task("a", 5, vec![]),
            make_task("b", 3, vec![("a", Relation::FinishToStart, 2)]),
            make_task("c", 20, vec![]),
        ];
        let first = run(tasks);
        let second = run(first.tasks.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn test_acyclic_converges_within_chain_length() {
        let outcome = run(vec![
            make_task("a", 1, vec![]),
            make_task("b", 1, vec![("a", Relation::FinishToStart, 0)]),
            make_task("c", 1, vec![("b", Relation::FinishToStart, 0)]),
            make_task("d", 1, vec![("c", Relation::FinishToStart, 0)]),
        ]);
        assert!(outcome.forward.converged);
        assert!(outcome.backward.converged);
        assert!(outcome.forward.passes <= 4);
        assert!(outcome.backward.passes <= 4);
    }

    #[test]
    fn test_cycle_tolerated() {
        let outcome = run(vec![
            make_task("a", 2, vec![("b", Relation::FinishToStart, 0)]),
            make_task("b", 3, vec![("a", Relation::FinishToStart, 0)]),
        ]);

        assert!(!outcome.forward.converged);
        assert_eq!(outcome.forward.passes, 100);
        assert!(!outcome.is_consistent());
        for task in &outcome.tasks {
            assert!(task.is_scheduled());
            assert!(task.slack.is_some());
        }
    }

    #[test]
    fn test_cycle_rejected_when_configured() {
        let config = EngineConfig {
            reject_cycles: true,
            ..EngineConfig::default()
        };
        let result = schedule(
            vec![
                make_task("a", 2, vec![("b", Relation::FinishToStart, 0)]),
                make_task("b", 3, vec![("a", Relation::FinishToStart, 0)]),
                make_task("c", 1, vec![]),
            ],
            anchor(),
            &config,
        );
        let expected = vec!["a".to_string(), "b".to_string()];
        assert_eq!(result, Err(EngineError::CircularDependency(expected)));

        let ok = schedule(vec![make_task("c", 1, vec![])], anchor(), &config);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_anchor_start_only_without_dependencies() {
        let mut free = make_task("free", 2, vec![]);
        free.anchor_start = Some(day(10));
        let mut before = make_task("before", 2, vec![]);
        before.anchor_start = Some(day(-10));
        let mut bound = make_task("bound", 2, vec![("before", Relation::FinishToStart, 0)]);
        bound.anchor_start = Some(day(30));
        let mut dangling = make_task("dangling", 2, vec![("ghost", Relation::FinishToStart, 0)]);
        dangling.anchor_start = Some(day(4));

        let outcome = run(vec![free, before, bound, dangling]);

        assert_eq!(find(&outcome, "free").earliest_start, Some(day(10)));
        assert_eq!(find(&outcome, "before").earliest_start, Some(day(0)));
        assert_eq!(find(&outcome, "bound").earliest_start, Some(day(2)));
        assert_eq!(find(&outcome, "dangling").earliest_start, Some(day(4)));
    }

    #[test]
    fn test_empty_task_set() {
        let outcome = run(vec![]);
        assert!(outcome.tasks.is_empty());
        assert_eq!(outcome.project_end, anchor());
        assert!(outcome.is_consistent());
    }

    #[test]
    fn test_critical_flags_cover_every_task() {
        let outcome = run(vec![make_task("a", 5, vec![]), make_task("b", 1, vec![])]);
        assert_eq!(
            outcome.critical_flags(),
            vec![("a".to_string(), true), ("b".to_string(), false)]
        );
    }

    #[test]
    fn test_validation_errors() {
        let config = EngineConfig::default();
        assert_eq!(
            schedule(
                vec![make_task("a", 1, vec![]), make_task("a", 2, vec![])],
                anchor(),
                &config,
            ),
            Err(EngineError::DuplicateTaskId("a".to_string()))
        );
        assert_eq!(
            schedule(vec![make_task("a", 0, vec![])], anchor(), &config),
            Err(EngineError::InvalidDuration {
                task_id: "a".to_string(),
                duration_days: 0,
            })
        );
        assert_eq!(
            schedule(
                vec![make_task("a", 1, vec![("a", Relation::FinishToStart, 0)])],
                anchor(),
                &config,
            ),
            Err(EngineError::SelfDependency("a".to_string()))
        );
    }
}
