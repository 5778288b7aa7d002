#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Hierarchical cost aggregation over the timeline model: combines a
//! node's own cost samples with those of its capability-group children
//! and linked components, tolerating reference cycles and memoizing
//! per query window.

/// Revision-validated memoization of query results.
pub mod cache;
/// Depth-first aggregation with cycle cutting.
pub mod engine;
/// Per-dimension time-grid merge.
pub mod merge;
/// Store + engine + telemetry facade.
pub mod runtime;
/// Telemetry helpers for the aggregation crate.
pub mod telemetry;

pub use cache::QueryCache;
pub use engine::{
    AbortFlag, AggregationDiagnostic, AggregationEngine, CostAggregate, DimensionFilter,
    QueryError,
};
pub use runtime::TimelineRuntime;
pub use telemetry::{AggregationTelemetry, AggregationTelemetryBuilder};
