#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Mission-planning timeline model: time-bound activities, branching
//! decisions, capability-tagged child groups, and cross-tree links.

/// Cost sample series per resource dimension.
pub mod cost;
/// Error taxonomy for model mutations and lookups.
pub mod error;
/// Activity and decision node types.
pub mod node;
/// Capability groups, external links, and the reverse-reference index.
pub mod registry;
/// Inclusive time interval value type.
pub mod span;
/// Node store: mutation API, revisions, invalidation events.
pub mod store;
/// Telemetry helpers for the timeline crate.
pub mod telemetry;

pub use cost::CostSeries;
pub use error::TimelineError;
pub use node::{ActivityNode, DecisionNode, TimelineNode};
pub use registry::CapabilityRegistry;
pub use span::TimeSpan;
pub use store::{
    ContainmentPolicy, RemovalPolicy, StoreConfig, TimelineSnapshot, TimelineStore,
};
pub use telemetry::{TimelineTelemetry, TimelineTelemetryBuilder};
