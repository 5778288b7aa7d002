use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by timeline mutations and lookups.
///
/// Every mutation that returns one of these leaves the model unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimelineError {
    /// Span with `start` after `end`.
    #[error("invalid span: start {start} is after end {end}")]
    InvalidSpan {
        /// Requested start instant.
        start: DateTime<Utc>,
        /// Requested end instant.
        end: DateTime<Utc>,
    },
    /// Cost samples out of order or duplicated in time.
    #[error("cost series '{dimension}' has non-increasing sample times")]
    UnorderedSamples {
        /// Offending cost dimension.
        dimension: String,
    },
    /// Branch index outside the decision's branch list.
    #[error("branch index {index} out of range for {len} branches")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of branches.
        len: usize,
    },
    /// Duration query against a branch with no members.
    #[error("selected branch has no member activities")]
    EmptyBranch,
    /// Removal would leave dangling group/link/branch references.
    #[error("node {0} is still referenced; removal would dangle")]
    DanglingReference(Uuid),
    /// No node with the given id.
    #[error("unknown node {0}")]
    UnknownNode(Uuid),
    /// Containment policy rejected a span escaping its parent.
    #[error("span of {node} escapes enclosing span of {parent}")]
    SpanOutsideParent {
        /// Edited node.
        node: Uuid,
        /// Enclosing activity whose span was escaped.
        parent: Uuid,
    },
    /// Operation requires an activity node.
    #[error("node {0} is not an activity")]
    NotAnActivity(Uuid),
    /// Operation requires a decision node.
    #[error("node {0} is not a decision")]
    NotADecision(Uuid),
}
