//! Dependency notation codec.
//!
//! Two notations are supported:
//! - Boundary notation typed by users: `<position><code><±lag>`, e.g. `3FC+5`,
//!   `2CC`, `4`. The position is a 1-based row in the displayed ordering,
//!   the code defaults to `FC` and the lag to 0.
//! - Canonical notation stored with a task: `<target_id>:<code>:<lag>`, plus
//!   the legacy bare `<target_id>` form meaning `FC` with no lag.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::{DependencyEdge, Relation};
use crate::ordering::{ReferenceIndexer, ReferenceResolver};

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)((?i:FC|CC|FF|CF))?([+-][0-9]+)?$").expect("token pattern is valid")
});

/// Rendered in place of a position when the target is no longer displayed.
pub const UNKNOWN_POSITION: &str = "?";

/// Errors raised while reading dependency notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid dependency token: {0:?}")]
    InvalidToken(String),
    #[error("Dependency {token:?} refers to a row that does not exist ({available} tasks)")]
    UnknownReference { token: String, available: usize },
    #[error("Task {0:?} cannot depend on itself")]
    SelfReference(String),
}

/// Parse one boundary token for the task `editing_task_id`.
pub fn parse_edge<R>(
    token: &str,
    editing_task_id: &str,
    resolver: &R,
) -> Result<DependencyEdge, CodecError>
where
    R: ReferenceResolver + ?Sized,
{
    let token = token.trim();
    let caps = TOKEN_PATTERN
        .captures(token)
        .ok_or_else(|| CodecError::InvalidToken(token.to_string()))?;

    let relation = match caps.get(2) {
        Some(code) => Relation::from_code(code.as_str())
            .ok_or_else(|| CodecError::InvalidToken(token.to_string()))?,
        None => Relation::FinishToStart,
    };
    let lag_days = match caps.get(3) {
        Some(lag) => lag
            .as_str()
            .parse::<i64>()
            .map_err(|_| CodecError::InvalidToken(token.to_string()))?,
        None => 0,
    };

    let unknown = || CodecError::UnknownReference {
        token: token.to_string(),
        available: resolver.position_count(),
    };
    // Digits too long for usize are out of range, not malformed.
    let position = caps[1].parse::<usize>().map_err(|_| unknown())?;
    let target_id = resolver.resolve(position).ok_or_else(unknown)?;

    if target_id == editing_task_id {
        return Err(CodecError::SelfReference(editing_task_id.to_string()));
    }

    Ok(DependencyEdge::new(target_id.into(), relation, lag_days))
}

/// Render an edge in boundary notation.
///
/// A finish-to-start edge with no lag renders as the bare position; any
/// other edge carries its code, and a signed lag when non-zero.
pub fn format_edge<I>(edge: &DependencyEdge, indexer: &I) -> String
where
    I: ReferenceIndexer + ?Sized,
{
    let mut out = match indexer.position_of(&edge.target_id) {
        Some(position) => position.to_string(),
        None => UNKNOWN_POSITION.to_string(),
    };
    if edge.relation == Relation::FinishToStart && edge.lag_days == 0 {
        return out;
    }
    out.push_str(edge.relation.code());
    if edge.lag_days != 0 {
        out.push_str(&format!("{:+}", edge.lag_days));
    }
    out
}

/// Parse a whole dependency cell, e.g. `"1, 3FC+2; 4CC"`.
///
/// Tokens are separated by commas, semicolons or whitespace. The first bad
/// token aborts the parse.
pub fn parse_dependency_list<R>(
    input: &str,
    editing_task_id: &str,
    resolver: &R,
) -> Result<Vec<DependencyEdge>, CodecError>
where
    R: ReferenceResolver + ?Sized,
{
    input
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| parse_edge(token, editing_task_id, resolver))
        .collect()
}

/// Render a dependency cell, joining tokens with `", "`.
pub fn format_dependency_list<I>(edges: &[DependencyEdge], indexer: &I) -> String
where
    I: ReferenceIndexer + ?Sized,
{
    edges
        .iter()
        .map(|edge| format_edge(edge, indexer))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse the stored form `<target_id>:<code>:<lag>` or a legacy bare id.
pub fn parse_canonical(s: &str) -> Result<DependencyEdge, CodecError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CodecError::InvalidToken(s.to_string()));
    }
    if !s.contains(':') {
        return Ok(DependencyEdge::finish_to_start(s));
    }

    // Split from the right so ids may themselves contain ':'.
    let mut parts = s.rsplitn(3, ':');
    let (lag, code, target_id) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lag), Some(code), Some(target_id)) => (lag, code, target_id),
        _ => return Err(CodecError::InvalidToken(s.to_string())),
    };
    let relation =
        Relation::from_code(code).ok_or_else(|| CodecError::InvalidToken(s.to_string()))?;
    let lag_days = lag
        .parse::<i64>()
        .map_err(|_| CodecError::InvalidToken(s.to_string()))?;
    if target_id.is_empty() {
        return Err(CodecError::InvalidToken(s.to_string()));
    }

    Ok(DependencyEdge::new(target_id.into(), relation, lag_days))
}

/// Render the stored form `<target_id>:<code>:<lag>`.
pub fn format_canonical(edge: &DependencyEdge) -> String {
    format!(
        "{}:{}:{}",
        edge.target_id,
        edge.relation.code(),
        edge.lag_days
    )
}
