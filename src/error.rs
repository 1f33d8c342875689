//! Error taxonomy surfaced to callers.
//!
//! Only structural input problems and total infeasibility are errors. Dropping
//! optional locations is a normal outcome and is reported through the result.

use thiserror::Error;

/// A structural problem found while loading an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("number of days must be at least 1")]
    NoDays,
    #[error("{days} days need {required} anchor nodes but the instance has {nodes}")]
    MissingAnchors {
        days: usize,
        required: usize,
        nodes: usize,
    },
    #[error("{events} events do not fit after {anchors} anchors in {nodes} nodes")]
    TooManyEvents {
        events: usize,
        anchors: usize,
        nodes: usize,
    },
    #[error("travel matrix has {rows} rows, expected {expected}")]
    MatrixRows { rows: usize, expected: usize },
    #[error("travel matrix row {row} has {len} columns, expected {expected}")]
    MatrixColumns {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("{field} has {len} entries, expected {expected}")]
    Misaligned {
        field: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("window of node {node} is inverted (earliest {earliest} > latest {latest})")]
    InvertedWindow {
        node: usize,
        earliest: i64,
        latest: i64,
    },
    #[error("negative travel time {value} from node {from} to node {to}")]
    NegativeTravel { from: usize, to: usize, value: i64 },
    #[error("negative service duration {value} at node {node}")]
    NegativeService { node: usize, value: i64 },
    #[error("negative penalty {value} at node {node}")]
    NegativePenalty { node: usize, value: i64 },
}

/// Failure of a planning run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("malformed instance: {0}")]
    MalformedInstance(#[from] InstanceError),
    #[error("no feasible solution: mandatory locations cannot be scheduled together")]
    NoFeasibleSolution,
    #[error("invalid instance json: {0}")]
    Json(#[from] serde_json::Error),
}
