//! Indexed precedence graph used by both relaxation passes.

use chrono::{Days, NaiveDate};

use crate::log_warn;
use crate::models::{Relation, Task};
use crate::ordering::{ReferenceResolver, TaskOrdering};

/// One resolved edge, stored on both of its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    /// Slot of the task at the other end.
    pub task: usize,
    pub relation: Relation,
    pub lag: i64,
}

/// Pre-computed task data for the relaxation passes.
/// All lookups use direct array indexing by task slot.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    /// Task id <-> slot mapping, in input order.
    pub ordering: TaskOrdering,
    /// Durations indexed by slot.
    pub durations: Vec<i64>,
    /// Earliest allowed start for tasks without valid dependencies
    /// (`max(0, anchor_start)` as an offset), indexed by slot.
    pub releases: Vec<i64>,
    /// Edges to predecessors, indexed by the dependent's slot.
    pub predecessors: Vec<Vec<Link>>,
    /// Edges to dependents, indexed by the predecessor's slot.
    pub successors: Vec<Vec<Link>>,
}

impl ProjectGraph {
    /// Build the graph from validated tasks.
    ///
    /// Edges whose target is not in `tasks` are dropped; a task left with no
    /// edges schedules from its own release date.
    pub fn new(tasks: &[Task], project_anchor: NaiveDate, verbosity: u8) -> Self {
        let ordering = TaskOrdering::from_ids(tasks.iter().map(|t| t.id.as_str()));
        let n = ordering.position_count();

        let mut durations = vec![0; n];
        let mut releases = vec![0; n];
        let mut predecessors: Vec<Vec<Link>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<Link>> = vec![Vec::new(); n];

        for task in tasks {
            let Some(idx) = ordering.slot(&task.id) else {
                continue;
            };
            durations[idx] = task.duration_days;
            releases[idx] = task
                .anchor_start
                .map(|date| day_offset(project_anchor, date).max(0))
                .unwrap_or(0);

            for dep in &task.dependencies {
                let Some(pred) = ordering.slot(&dep.target_id) else {
                    log_warn!(
                        verbosity,
                        "Ignoring dependency of {} on unknown task {}",
                        task.id,
                        dep.target_id
                    );
                    continue;
                };
                predecessors[idx].push(Link {
                    task: pred,
                    relation: dep.relation,
                    lag: dep.lag_days,
                });
                successors[pred].push(Link {
                    task: idx,
                    relation: dep.relation,
                    lag: dep.lag_days,
                });
            }
        }

        Self {
            ordering,
            durations,
            releases,
            predecessors,
            successors,
        }
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// Id of the task in `slot`, for log messages.
    pub fn name(&self, slot: usize) -> &str {
        self.ordering.id(slot).unwrap_or("?")
    }
}

/// Whole days from `anchor` to `date` (negative when `date` is earlier).
pub fn day_offset(anchor: NaiveDate, date: NaiveDate) -> i64 {
    (date - anchor).num_days()
}

/// The date `offset` days after `anchor`, clamped to the representable range.
pub fn date_at(anchor: NaiveDate, offset: i64) -> NaiveDate {
    if offset >= 0 {
        anchor
            .checked_add_days(Days::new(offset.unsigned_abs()))
            .unwrap_or(NaiveDate::MAX)
    } else {
        anchor
            .checked_sub_days(Days::new(offset.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN)
    }
}
