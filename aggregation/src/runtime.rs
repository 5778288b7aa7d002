use std::sync::Arc;

use chronoplan_timeline::{
    CostSeries, StoreConfig, TimeSpan, TimelineError, TimelineNode, TimelineStore,
};
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::engine::{AbortFlag, AggregationEngine, CostAggregate, DimensionFilter, QueryError};
use crate::telemetry::AggregationTelemetry;

/// Facade composing the node store and the aggregation engine behind the
/// editing/UI-facing API: mutations delegate to the store (which handles
/// invalidation and event publication), queries to the engine.
pub struct TimelineRuntime {
    store: Arc<TimelineStore>,
    engine: AggregationEngine,
    telemetry: Option<AggregationTelemetry>,
}

impl Default for TimelineRuntime {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TimelineRuntime {
    /// Creates a runtime over a fresh store with the given policies.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::from_store(Arc::new(TimelineStore::new(config)))
    }

    /// Creates a runtime over an existing store (which may carry its own
    /// telemetry and event publisher).
    #[must_use]
    pub fn from_store(store: Arc<TimelineStore>) -> Self {
        Self {
            engine: AggregationEngine::new(Arc::clone(&store)),
            store,
            telemetry: None,
        }
    }

    /// Injects telemetry for the runtime and its engine.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: AggregationTelemetry) -> Self {
        self.engine = AggregationEngine::new(Arc::clone(&self.store))
            .with_telemetry(telemetry.clone());
        self.telemetry = Some(telemetry);
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<TimelineStore> {
        &self.store
    }

    // ---- inbound (editing layer) ------------------------------------

    /// Creates an activity and returns its id.
    pub fn create_activity(
        &self,
        display_name: &str,
        span: TimeSpan,
        costs: Vec<CostSeries>,
    ) -> Uuid {
        let id = self.store.create_activity(display_name, span, costs);
        self.log(
            LogLevel::Info,
            "activity created",
            json!({ "node": id, "name": display_name }),
        );
        id
    }

    /// Creates a decision over candidate chains and returns its id.
    pub fn create_decision(&self, display_name: &str, branches: Vec<Vec<Uuid>>) -> Uuid {
        let id = self.store.create_decision(display_name, branches);
        self.log(
            LogLevel::Info,
            "decision created",
            json!({ "node": id, "name": display_name }),
        );
        id
    }

    /// Reschedules an activity.
    pub fn set_span(&self, node: Uuid, span: TimeSpan) -> Result<(), TimelineError> {
        self.store.set_span(node, span)
    }

    /// Replaces an activity's own cost series.
    pub fn set_costs(&self, node: Uuid, costs: Vec<CostSeries>) -> Result<(), TimelineError> {
        self.store.set_costs(node, costs)
    }

    /// Renames a node.
    pub fn set_display_name(&self, node: Uuid, name: &str) -> Result<(), TimelineError> {
        self.store.set_display_name(node, name)
    }

    /// Atomically replaces one capability group.
    pub fn set_group(
        &self,
        node: Uuid,
        tag: &str,
        children: Vec<Uuid>,
    ) -> Result<(), TimelineError> {
        self.store.set_group(node, tag, children)
    }

    /// Sets or clears a node's external link.
    pub fn set_link(&self, node: Uuid, target: Option<Uuid>) -> Result<(), TimelineError> {
        self.store.set_link(node, target)
    }

    /// Replaces a decision's candidate chains.
    pub fn set_branches(
        &self,
        decision: Uuid,
        branches: Vec<Vec<Uuid>>,
    ) -> Result<(), TimelineError> {
        self.store.set_branches(decision, branches)
    }

    /// Commits one candidate branch.
    pub fn select_branch(&self, decision: Uuid, index: usize) -> Result<(), TimelineError> {
        self.store.select_branch(decision, index)?;
        self.log(
            LogLevel::Info,
            "branch committed",
            json!({ "decision": decision, "branch": index }),
        );
        Ok(())
    }

    /// Removes a node under the store's removal policy.
    pub fn remove_node(&self, node: Uuid) -> Result<(), TimelineError> {
        self.store.remove_node(node)?;
        self.log(LogLevel::Info, "node removed", json!({ "node": node }));
        Ok(())
    }

    // ---- outbound (rendering / persistence layer) -------------------

    /// Duration of an activity or of a decision's selected branch chain.
    pub fn duration(&self, node: Uuid) -> Result<TimeSpan, TimelineError> {
        self.store.duration(node)
    }

    /// Clone of a node's current state.
    #[must_use]
    pub fn node(&self, node: Uuid) -> Option<TimelineNode> {
        self.store.node(node)
    }

    /// Aggregated cost of a node over a window.
    pub fn query_cost(
        &self,
        node: Uuid,
        window: TimeSpan,
        filter: &DimensionFilter,
    ) -> Result<CostAggregate, QueryError> {
        self.engine.query_cost(node, window, filter)
    }

    /// Aggregated cost with a caller-held deadline/abort flag.
    pub fn query_cost_abortable(
        &self,
        node: Uuid,
        window: TimeSpan,
        filter: &DimensionFilter,
        abort: Option<&AbortFlag>,
    ) -> Result<CostAggregate, QueryError> {
        self.engine.query_cost_abortable(node, window, filter, abort)
    }

    fn log(&self, level: LogLevel, message: &str, fields: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.log(level, message, fields);
        }
    }
}

impl std::fmt::Debug for TimelineRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineRuntime")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use chronoplan_timeline::TimelineTelemetry;
    use shared_event_bus::{EventPublisher, MemoryEventBus};
    use tempfile::tempdir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn span(start: i64, end: i64) -> TimeSpan {
        TimeSpan::new(at(start), at(end)).unwrap()
    }

    fn power(points: &[(i64, f64)]) -> CostSeries {
        CostSeries::new(
            "power",
            points.iter().map(|&(t, v)| (at(t), v)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn end_to_end_plan_editing_and_querying() {
        let runtime = TimelineRuntime::default();
        let a = runtime.create_activity("comm pass", span(0, 10), vec![power(&[(0, 5.0), (10, 5.0)])]);
        let b = runtime.create_activity("backup pass", span(0, 10), vec![power(&[(0, 8.0), (10, 8.0)])]);
        let d = runtime.create_decision("pass selection", vec![vec![a], vec![b]]);
        let root = runtime.create_activity("orbit day", span(0, 10), Vec::new());
        runtime.set_group(root, "resource-activity", vec![d]).unwrap();

        assert_eq!(runtime.duration(d).unwrap(), span(0, 10));
        let before = runtime
            .query_cost(root, span(0, 10), &DimensionFilter::All)
            .unwrap();
        assert_eq!(before.dimension("power").unwrap().samples[0].1, 5.0);

        runtime.select_branch(d, 1).unwrap();
        let after = runtime
            .query_cost(root, span(0, 10), &DimensionFilter::All)
            .unwrap();
        assert_eq!(after.dimension("power").unwrap().samples[0].1, 8.0);
    }

    #[test]
    fn strict_removal_surfaces_through_the_facade() {
        let runtime = TimelineRuntime::default();
        let a = runtime.create_activity("a", span(0, 1), Vec::new());
        let root = runtime.create_activity("root", span(0, 10), Vec::new());
        runtime.set_group(root, "resource-activity", vec![a]).unwrap();
        assert_eq!(
            runtime.remove_node(a),
            Err(TimelineError::DanglingReference(a))
        );
    }

    #[test]
    fn store_events_reach_subscribers_through_the_runtime() {
        let bus = Arc::new(MemoryEventBus::new(64));
        let store_telemetry = TimelineTelemetry::builder("timeline-store")
            .event_publisher(Arc::clone(&bus) as Arc<dyn EventPublisher>)
            .build()
            .unwrap();
        let store = Arc::new(TimelineStore::new(StoreConfig::default()).with_telemetry(store_telemetry));
        let runtime = TimelineRuntime::from_store(store);
        let a = runtime.create_activity("a", span(0, 1), Vec::new());
        runtime.set_span(a, span(0, 2)).unwrap();
        let kinds: Vec<String> = bus.backlog().into_iter().map(|e| e.kind).collect();
        assert!(kinds
            .iter()
            .all(|kind| kind == "timeline.node.invalidated"));
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn runtime_telemetry_logs_queries_and_edits() {
        let dir = tempdir().unwrap();
        let telemetry = AggregationTelemetry::builder("timeline-runtime")
            .log_path(dir.path().join("runtime.log"))
            .build()
            .unwrap();
        let runtime = TimelineRuntime::default().with_telemetry(telemetry);
        let a = runtime.create_activity("a", span(0, 10), vec![power(&[(0, 1.0), (10, 1.0)])]);
        runtime
            .query_cost(a, span(0, 10), &DimensionFilter::All)
            .unwrap();
        let content = std::fs::read_to_string(dir.path().join("runtime.log")).unwrap();
        assert!(content.contains("activity created"));
        assert!(content.contains("cost query served"));
    }
}
