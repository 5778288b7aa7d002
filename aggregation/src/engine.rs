use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chronoplan_timeline::{
    CostSeries, TimeSpan, TimelineNode, TimelineSnapshot, TimelineStore,
};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::{CacheKey, QueryCache};
use crate::merge;
use crate::telemetry::AggregationTelemetry;

/// Errors terminating a cost query. Cycles are never one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Query window with `start` after `end`.
    #[error("query span is empty: start is after end")]
    EmptyQuerySpan,
    /// The query root does not exist.
    #[error("unknown node {0}")]
    UnknownNode(Uuid),
    /// The caller's abort flag tripped between node visits.
    #[error("query aborted by caller")]
    Aborted,
}

/// Non-fatal observations attached to a successful query result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AggregationDiagnostic {
    /// An edge led back to a node on the active traversal stack; the edge
    /// contributed nothing. Cycles are an expected topology, not an error.
    CycleDetected(Uuid),
    /// A group/link/branch referenced a node that no longer exists; the
    /// edge contributed nothing.
    MissingReference(Uuid),
}

/// Result of one cost query: merged series per dimension plus any
/// diagnostics gathered along the traversal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostAggregate {
    /// Merged cost series keyed by dimension.
    pub series: IndexMap<String, CostSeries>,
    /// Cycle and dangling-reference observations.
    pub diagnostics: Vec<AggregationDiagnostic>,
}

impl CostAggregate {
    /// Series for one dimension, if it contributed anything.
    #[must_use]
    pub fn dimension(&self, dimension: &str) -> Option<&CostSeries> {
        self.series.get(dimension)
    }

    /// Whether any cycle was cut during the traversal.
    #[must_use]
    pub fn hit_cycle(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, AggregationDiagnostic::CycleDetected(_)))
    }
}

/// Which cost dimensions a query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionFilter {
    /// Every dimension encountered.
    All,
    /// Only the named dimensions.
    Named(IndexSet<String>),
}

impl DimensionFilter {
    /// Filter selecting the given dimensions.
    #[must_use]
    pub fn named(dimensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Named(dimensions.into_iter().map(Into::into).collect())
    }

    /// Whether the dimension passes the filter.
    #[must_use]
    pub fn admits(&self, dimension: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.contains(dimension),
        }
    }

    /// Canonical (sorted) form for cache keying; `None` means all.
    #[must_use]
    pub fn canonical(&self) -> Option<Vec<String>> {
        match self {
            Self::All => None,
            Self::Named(names) => {
                let mut sorted: Vec<String> = names.iter().cloned().collect();
                sorted.sort_unstable();
                Some(sorted)
            }
        }
    }
}

/// Caller-held flag for cooperative query abort. The engine checks it
/// between node visits, never mid-merge.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    /// Creates an untripped flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that in-flight queries holding this flag return early.
    pub fn trip(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether abort has been requested.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Recursive cost aggregation over the timeline graph.
///
/// For a node and a query window, the engine merges the node's own cost
/// samples, the recursively aggregated costs of every capability-group
/// child (in group and child order), the selected branch chain of a
/// decision, and the external-link target if present, each intersected
/// with the window. A visiting set cuts reference cycles: the cyclic
/// edge contributes nothing, a `CycleDetected` diagnostic is recorded,
/// and traversal visits each distinct node at most once per query.
pub struct AggregationEngine {
    store: Arc<TimelineStore>,
    cache: QueryCache,
    telemetry: Option<AggregationTelemetry>,
}

impl AggregationEngine {
    /// Creates an engine over the given store.
    #[must_use]
    pub fn new(store: Arc<TimelineStore>) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: AggregationTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<TimelineStore> {
        &self.store
    }

    /// Cache size, for observability.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Aggregated cost of `node` over `window`, restricted to the
    /// dimensions the filter admits.
    pub fn query_cost(
        &self,
        node: Uuid,
        window: TimeSpan,
        filter: &DimensionFilter,
    ) -> Result<CostAggregate, QueryError> {
        self.query_cost_abortable(node, window, filter, None)
    }

    /// Like [`Self::query_cost`], but checks the abort flag between node
    /// visits and returns `Err(Aborted)` once it trips.
    pub fn query_cost_abortable(
        &self,
        node: Uuid,
        window: TimeSpan,
        filter: &DimensionFilter,
        abort: Option<&AbortFlag>,
    ) -> Result<CostAggregate, QueryError> {
        if window.start > window.end {
            return Err(QueryError::EmptyQuerySpan);
        }
        let snapshot = self.store.snapshot();
        if !snapshot.contains(node) {
            return Err(QueryError::UnknownNode(node));
        }
        let mut visiting = HashSet::new();
        let mut diagnostics = Vec::new();
        let series = self.aggregate(
            &snapshot,
            node,
            &window,
            filter,
            &mut visiting,
            &mut diagnostics,
            abort,
        )?;
        if let Some(telemetry) = &self.telemetry {
            let level = if diagnostics.is_empty() {
                LogLevel::Debug
            } else {
                LogLevel::Warn
            };
            let _ = telemetry.log(
                level,
                "cost query served",
                json!({
                    "node": node,
                    "dimensions": series.len(),
                    "diagnostics": diagnostics.len(),
                }),
            );
        }
        Ok(CostAggregate {
            series,
            diagnostics,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn aggregate(
        &self,
        snapshot: &TimelineSnapshot,
        node: Uuid,
        window: &TimeSpan,
        filter: &DimensionFilter,
        visiting: &mut HashSet<Uuid>,
        diagnostics: &mut Vec<AggregationDiagnostic>,
        abort: Option<&AbortFlag>,
    ) -> Result<IndexMap<String, CostSeries>, QueryError> {
        if abort.is_some_and(AbortFlag::is_tripped) {
            return Err(QueryError::Aborted);
        }
        if visiting.contains(&node) {
            diagnostics.push(AggregationDiagnostic::CycleDetected(node));
            return Ok(IndexMap::new());
        }
        let Some(current) = snapshot.node(node) else {
            diagnostics.push(AggregationDiagnostic::MissingReference(node));
            return Ok(IndexMap::new());
        };
        let revision = snapshot.revision(node).unwrap_or(0);
        let key = CacheKey::new(node, *window, filter);
        if let Some(cached) = self.cache.lookup(&key, revision) {
            return Ok((*cached).clone());
        }

        let diagnostics_before = diagnostics.len();
        visiting.insert(node);
        let mut accumulator = IndexMap::new();

        match current {
            TimelineNode::Activity(activity) => {
                for (dimension, series) in &activity.own_costs {
                    if !filter.admits(dimension) {
                        continue;
                    }
                    let cut = series.slice(window);
                    if !cut.is_empty() {
                        accumulator.insert(dimension.clone(), cut);
                    }
                }
            }
            TimelineNode::Decision(decision) => {
                // Committed-plan semantics: only the selected branch's
                // chain contributes; decisions carry no own costs.
                if let Some(members) = decision.selected_branch() {
                    for &member in members {
                        let sub = self.aggregate(
                            snapshot,
                            member,
                            window,
                            filter,
                            visiting,
                            diagnostics,
                            abort,
                        )?;
                        merge::merge_into(&mut accumulator, sub);
                    }
                }
            }
        }

        if let Some(groups) = snapshot.groups_of(node) {
            for children in groups.values() {
                for &child in children {
                    let sub = self.aggregate(
                        snapshot,
                        child,
                        window,
                        filter,
                        visiting,
                        diagnostics,
                        abort,
                    )?;
                    merge::merge_into(&mut accumulator, sub);
                }
            }
        }

        if let Some(target) = snapshot.link(node) {
            let sub = self.aggregate(
                snapshot,
                target,
                window,
                filter,
                visiting,
                diagnostics,
                abort,
            )?;
            merge::merge_into(&mut accumulator, sub);
        }

        visiting.remove(&node);
        // A result truncated by a cycle cut (or a dangling edge) is only
        // valid for the traversal that produced it; never cache those.
        if diagnostics.len() == diagnostics_before {
            self.cache
                .insert(key, revision, Arc::new(accumulator.clone()));
        }
        Ok(accumulator)
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("cache", &self.cache)
            .finish()
    }
}
