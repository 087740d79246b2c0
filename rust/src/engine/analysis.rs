//! Slack and critical flags from the two schedules.

use super::types::{Span, TaskTiming};

/// Pair up earliest and latest spans and derive slack.
///
/// Dates are passed through untouched. Both slices are indexed by task slot
/// and must have the same length.
pub fn analyze(earliest: &[Span], latest: &[Span]) -> Vec<TaskTiming> {
    debug_assert_eq!(earliest.len(), latest.len());
    earliest
        .iter()
        .zip(latest)
        .map(|(&earliest, &latest)| TaskTiming {
            earliest,
            latest,
            slack: latest.start.saturating_sub(earliest.start),
        })
        .collect()
}
