use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::cost::CostSeries;
use crate::error::TimelineError;
use crate::node::{ActivityNode, DecisionNode, TimelineNode};
use crate::registry::CapabilityRegistry;
use crate::span::TimeSpan;
use crate::telemetry::TimelineTelemetry;

/// What `remove_node` does when the node is still referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Fail with `DanglingReference`; the caller must unlink first.
    #[default]
    Strict,
    /// Purge the node from every group, link, and branch that points at it.
    Cascade,
}

/// Whether a child activity's span must nest within its group parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainmentPolicy {
    /// Spans are independent of the grouping structure.
    #[default]
    Unconstrained,
    /// Span and group edits rejected when a grouped child activity's span
    /// escapes an enclosing activity's span.
    Enforced,
}

/// Store-wide policy configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreConfig {
    /// Removal behavior for referenced nodes.
    pub removal: RemovalPolicy,
    /// Span containment behavior.
    pub containment: ContainmentPolicy,
}

#[derive(Debug, Default)]
struct StoreState {
    nodes: IndexMap<Uuid, TimelineNode>,
    registry: CapabilityRegistry,
    revisions: IndexMap<Uuid, u64>,
    clock: u64,
}

/// Flat arena of timeline nodes with the full editing API.
///
/// Single-writer / many-reader: every edit serializes on the interior
/// write lock, applies atomically (validation precedes mutation, so a
/// failed edit leaves the model untouched), bumps the revision of the
/// edited node and of every transitive referrer, and publishes one
/// `timeline.node.invalidated` event per affected node before returning.
/// Reads see a consistent state; [`TimelineStore::snapshot`] gives the
/// aggregation layer an immutable view to traverse.
#[derive(Debug)]
pub struct TimelineStore {
    state: RwLock<StoreState>,
    config: StoreConfig,
    telemetry: Option<TimelineTelemetry>,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl TimelineStore {
    /// Creates an empty store with the given policies.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            config,
            telemetry: None,
        }
    }

    /// Attaches telemetry (logging + invalidation events).
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: TimelineTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Active policy configuration.
    #[must_use]
    pub const fn config(&self) -> StoreConfig {
        self.config
    }

    // ---- creation ----------------------------------------------------

    /// Creates an activity and returns its id.
    pub fn create_activity(
        &self,
        display_name: impl Into<String>,
        span: TimeSpan,
        costs: Vec<CostSeries>,
    ) -> Uuid {
        let activity = ActivityNode::new(display_name, span, costs);
        let id = activity.id;
        let affected = {
            let mut state = self.state.write();
            state.nodes.insert(id, TimelineNode::Activity(activity));
            invalidate(&mut state, id)
        };
        self.announce("create_activity", &affected);
        id
    }

    /// Creates a decision over the given candidate chains and returns its
    /// id. Branch members are plain ids and are not validated here.
    pub fn create_decision(
        &self,
        display_name: impl Into<String>,
        branches: Vec<Vec<Uuid>>,
    ) -> Uuid {
        let decision = DecisionNode::new(display_name, branches);
        let id = decision.id;
        let members = decision.all_members();
        let affected = {
            let mut state = self.state.write();
            state.nodes.insert(id, TimelineNode::Decision(decision));
            state.registry.set_branch_refs(id, members);
            invalidate(&mut state, id)
        };
        self.announce("create_decision", &affected);
        id
    }

    // ---- mutation ----------------------------------------------------

    /// Reschedules an activity. Under enforced containment the new span
    /// must stay inside every group parent's span.
    pub fn set_span(&self, node: Uuid, span: TimeSpan) -> Result<(), TimelineError> {
        if span.start > span.end {
            return Err(TimelineError::InvalidSpan {
                start: span.start,
                end: span.end,
            });
        }
        let affected = {
            let mut state = self.state.write();
            match state.nodes.get(&node) {
                Some(TimelineNode::Activity(_)) => {}
                Some(TimelineNode::Decision(_)) => {
                    return Err(TimelineError::NotAnActivity(node))
                }
                None => return Err(TimelineError::UnknownNode(node)),
            }
            if self.config.containment == ContainmentPolicy::Enforced {
                check_containment(&state, node, &span)?;
            }
            if let Some(TimelineNode::Activity(activity)) = state.nodes.get_mut(&node) {
                activity.span = span;
            }
            invalidate(&mut state, node)
        };
        self.announce("set_span", &affected);
        Ok(())
    }

    /// Replaces an activity's own cost series wholesale.
    pub fn set_costs(&self, node: Uuid, costs: Vec<CostSeries>) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            match state.nodes.get_mut(&node) {
                Some(TimelineNode::Activity(activity)) => {
                    let mut own_costs = IndexMap::new();
                    for series in costs {
                        own_costs.insert(series.dimension.clone(), series);
                    }
                    activity.own_costs = own_costs;
                }
                Some(TimelineNode::Decision(_)) => {
                    return Err(TimelineError::NotAnActivity(node))
                }
                None => return Err(TimelineError::UnknownNode(node)),
            }
            invalidate(&mut state, node)
        };
        self.announce("set_costs", &affected);
        Ok(())
    }

    /// Renames a node.
    pub fn set_display_name(
        &self,
        node: Uuid,
        display_name: impl Into<String>,
    ) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            let display_name = display_name.into();
            match state.nodes.get_mut(&node) {
                Some(TimelineNode::Activity(activity)) => activity.display_name = display_name,
                Some(TimelineNode::Decision(decision)) => decision.display_name = display_name,
                None => return Err(TimelineError::UnknownNode(node)),
            }
            invalidate(&mut state, node)
        };
        self.announce("set_display_name", &affected);
        Ok(())
    }

    /// Atomically replaces one capability group of a node. An empty child
    /// list removes the tag. Children are not checked for existence; the
    /// aggregation engine and the deletion path own that.
    pub fn set_group(
        &self,
        node: Uuid,
        tag: impl Into<String>,
        children: Vec<Uuid>,
    ) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            if !state.nodes.contains_key(&node) {
                return Err(TimelineError::UnknownNode(node));
            }
            if self.config.containment == ContainmentPolicy::Enforced {
                check_children_containment(&state, node, &children)?;
            }
            state.registry.set_group(node, tag, children);
            invalidate(&mut state, node)
        };
        self.announce("set_group", &affected);
        Ok(())
    }

    /// Sets or clears a node's external link. The target may live in an
    /// unrelated subtree and may create a reference cycle; the aggregation
    /// engine tolerates that by construction.
    pub fn set_link(&self, node: Uuid, target: Option<Uuid>) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            if !state.nodes.contains_key(&node) {
                return Err(TimelineError::UnknownNode(node));
            }
            state.registry.set_link(node, target);
            invalidate(&mut state, node)
        };
        self.announce("set_link", &affected);
        Ok(())
    }

    /// Replaces a decision's candidate chains. If the previously selected
    /// index no longer exists, selection falls back to branch 0.
    pub fn set_branches(
        &self,
        decision: Uuid,
        branches: Vec<Vec<Uuid>>,
    ) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            let members = match state.nodes.get_mut(&decision) {
                Some(TimelineNode::Decision(node)) => {
                    node.branches = branches;
                    if node.selected >= node.branches.len() {
                        node.selected = 0;
                    }
                    node.all_members()
                }
                Some(TimelineNode::Activity(_)) => {
                    return Err(TimelineError::NotADecision(decision))
                }
                None => return Err(TimelineError::UnknownNode(decision)),
            };
            state.registry.set_branch_refs(decision, members);
            invalidate(&mut state, decision)
        };
        self.announce("set_branches", &affected);
        Ok(())
    }

    /// Commits one candidate branch. O(1) index update; the previous
    /// branch's contributions disappear from subsequent queries.
    pub fn select_branch(&self, decision: Uuid, index: usize) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            match state.nodes.get_mut(&decision) {
                Some(TimelineNode::Decision(node)) => {
                    if index >= node.branches.len() {
                        return Err(TimelineError::OutOfRange {
                            index,
                            len: node.branches.len(),
                        });
                    }
                    node.selected = index;
                }
                Some(TimelineNode::Activity(_)) => {
                    return Err(TimelineError::NotADecision(decision))
                }
                None => return Err(TimelineError::UnknownNode(decision)),
            }
            invalidate(&mut state, decision)
        };
        self.announce("select_branch", &affected);
        Ok(())
    }

    /// Removes a node. Strict policy fails with `DanglingReference` while
    /// anything still points at it; cascade policy purges those pointers.
    pub fn remove_node(&self, node: Uuid) -> Result<(), TimelineError> {
        let affected = {
            let mut state = self.state.write();
            if !state.nodes.contains_key(&node) {
                return Err(TimelineError::UnknownNode(node));
            }
            if self.config.removal == RemovalPolicy::Strict
                && state.registry.is_referenced(node)
            {
                return Err(TimelineError::DanglingReference(node));
            }
            // Ancestors captured before the pointers to them disappear.
            let affected = invalidate(&mut state, node);
            let referrers = state.registry.purge_references_to(node);
            for referrer in referrers {
                let members = match state.nodes.get_mut(&referrer) {
                    Some(TimelineNode::Decision(decision)) => {
                        for branch in &mut decision.branches {
                            branch.retain(|&member| member != node);
                        }
                        Some(decision.all_members())
                    }
                    _ => None,
                };
                if let Some(members) = members {
                    state.registry.set_branch_refs(referrer, members);
                }
            }
            state.registry.remove_node(node);
            state.nodes.shift_remove(&node);
            state.revisions.shift_remove(&node);
            affected
        };
        self.announce("remove_node", &affected);
        Ok(())
    }

    // ---- reads -------------------------------------------------------

    /// Whether the node exists.
    #[must_use]
    pub fn contains(&self, node: Uuid) -> bool {
        self.state.read().nodes.contains_key(&node)
    }

    /// Number of nodes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Whether the store holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    /// Ids of all nodes, in creation order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<Uuid> {
        self.state.read().nodes.keys().copied().collect()
    }

    /// Clone of a node.
    #[must_use]
    pub fn node(&self, node: Uuid) -> Option<TimelineNode> {
        self.state.read().nodes.get(&node).cloned()
    }

    /// Capability groups of a node.
    #[must_use]
    pub fn groups_of(&self, node: Uuid) -> Option<IndexMap<String, Vec<Uuid>>> {
        self.state.read().registry.groups_of(node).cloned()
    }

    /// External link target of a node.
    #[must_use]
    pub fn link(&self, node: Uuid) -> Option<Uuid> {
        self.state.read().registry.link(node)
    }

    /// Revision of a node; bumps on every edit reaching it. Used by the
    /// aggregation cache to reject stale entries.
    #[must_use]
    pub fn revision(&self, node: Uuid) -> Option<u64> {
        self.state.read().revisions.get(&node).copied()
    }

    /// Span of an activity, or the span union of a decision's selected
    /// branch chain. `EmptyBranch` for a branch with no member activities.
    pub fn duration(&self, node: Uuid) -> Result<TimeSpan, TimelineError> {
        let state = self.state.read();
        duration_in(&state.nodes, node)
    }

    /// Immutable view of the whole model for aggregation traversal.
    #[must_use]
    pub fn snapshot(&self) -> TimelineSnapshot {
        let state = self.state.read();
        TimelineSnapshot {
            nodes: state.nodes.clone(),
            registry: state.registry.clone(),
            revisions: state.revisions.clone(),
        }
    }

    fn announce(&self, op: &str, affected: &[(Uuid, u64)]) {
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        let _ = telemetry.log(
            LogLevel::Debug,
            "edit applied",
            json!({ "op": op, "invalidated": affected.len() }),
        );
        for (node, revision) in affected {
            let _ = telemetry.event(
                "timeline.node.invalidated",
                json!({ "node": node, "revision": revision, "op": op }),
            );
        }
    }
}

/// Bumps the revision of `node` and of every transitive referrer.
/// Over-invalidation is acceptable; under-invalidation never is.
fn invalidate(state: &mut StoreState, node: Uuid) -> Vec<(Uuid, u64)> {
    state.clock += 1;
    let clock = state.clock;
    let mut affected: IndexSet<Uuid> = IndexSet::new();
    affected.insert(node);
    affected.extend(state.registry.transitive_referrers(node));
    affected
        .into_iter()
        .map(|id| {
            state.revisions.insert(id, clock);
            (id, clock)
        })
        .collect()
}

fn duration_in(
    nodes: &IndexMap<Uuid, TimelineNode>,
    node: Uuid,
) -> Result<TimeSpan, TimelineError> {
    match nodes.get(&node) {
        Some(TimelineNode::Activity(activity)) => Ok(activity.span),
        Some(TimelineNode::Decision(decision)) => {
            let members = decision
                .selected_branch()
                .ok_or(TimelineError::EmptyBranch)?;
            let mut combined: Option<TimeSpan> = None;
            for member in members {
                if let Some(TimelineNode::Activity(activity)) = nodes.get(member) {
                    combined = Some(match combined {
                        Some(span) => span.union(&activity.span),
                        None => activity.span,
                    });
                }
            }
            combined.ok_or(TimelineError::EmptyBranch)
        }
        None => Err(TimelineError::UnknownNode(node)),
    }
}

fn check_containment(
    state: &StoreState,
    node: Uuid,
    span: &TimeSpan,
) -> Result<(), TimelineError> {
    for referrer in state.registry.referrers_of(node) {
        let grouped = state
            .registry
            .groups_of(referrer)
            .is_some_and(|groups| groups.values().any(|children| children.contains(&node)));
        if !grouped {
            continue;
        }
        if let Some(TimelineNode::Activity(parent)) = state.nodes.get(&referrer) {
            if !parent.span.contains_span(span) {
                return Err(TimelineError::SpanOutsideParent {
                    node,
                    parent: referrer,
                });
            }
        }
    }
    Ok(())
}

fn check_children_containment(
    state: &StoreState,
    parent: Uuid,
    children: &[Uuid],
) -> Result<(), TimelineError> {
    let Some(TimelineNode::Activity(parent_activity)) = state.nodes.get(&parent) else {
        return Ok(());
    };
    for child in children {
        if let Some(TimelineNode::Activity(activity)) = state.nodes.get(child) {
            if !parent_activity.span.contains_span(&activity.span) {
                return Err(TimelineError::SpanOutsideParent {
                    node: *child,
                    parent,
                });
            }
        }
    }
    Ok(())
}

/// Point-in-time clone of the model. Aggregation queries traverse this,
/// so concurrent edits never tear a running query.
#[derive(Debug, Clone)]
pub struct TimelineSnapshot {
    nodes: IndexMap<Uuid, TimelineNode>,
    registry: CapabilityRegistry,
    revisions: IndexMap<Uuid, u64>,
}

impl TimelineSnapshot {
    /// Node by id.
    #[must_use]
    pub fn node(&self, node: Uuid) -> Option<&TimelineNode> {
        self.nodes.get(&node)
    }

    /// Whether the node exists in this snapshot.
    #[must_use]
    pub fn contains(&self, node: Uuid) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of nodes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Capability groups of a node.
    #[must_use]
    pub fn groups_of(&self, node: Uuid) -> Option<&IndexMap<String, Vec<Uuid>>> {
        self.registry.groups_of(node)
    }

    /// External link target of a node.
    #[must_use]
    pub fn link(&self, node: Uuid) -> Option<Uuid> {
        self.registry.link(node)
    }

    /// Revision the node carried when the snapshot was taken.
    #[must_use]
    pub fn revision(&self, node: Uuid) -> Option<u64> {
        self.revisions.get(&node).copied()
    }

    /// Duration under the same rules as [`TimelineStore::duration`].
    pub fn duration(&self, node: Uuid) -> Result<TimeSpan, TimelineError> {
        duration_in(&self.nodes, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use shared_event_bus::{EventPublisher, MemoryEventBus};
    use std::sync::Arc;

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
    fn failed_span_edit_leaves_prior_span() {
        let store = TimelineStore::default();
        let id = store.create_activity("pass", span(0, 10), Vec::new());
        let err = store.set_span(id, span(0, 10)).and_then(|()| {
            // Force an invalid span through the public field path.
            store.set_span(
                id,
                TimeSpan {
                    start: at(9),
                    end: at(3),
                },
            )
        });
        assert!(err.is_err());
        assert_eq!(store.duration(id).unwrap(), span(0, 10));
    }

    #[test]
    fn decision_duration_follows_selection() {
        let store = TimelineStore::default();
        let a = store.create_activity("a", span(0, 10), Vec::new());
        let b = store.create_activity("b", span(20, 30), Vec::new());
        let d = store.create_decision("route", vec![vec![a], vec![b]]);
        assert_eq!(store.duration(d).unwrap(), span(0, 10));
        store.select_branch(d, 1).unwrap();
        assert_eq!(store.duration(d).unwrap(), span(20, 30));
    }

    #[test]
    fn selected_branch_chain_unions_member_spans() {
        let store = TimelineStore::default();
        let a = store.create_activity("a", span(0, 5), Vec::new());
        let b = store.create_activity("b", span(8, 12), Vec::new());
        let d = store.create_decision("route", vec![vec![a, b]]);
        assert_eq!(store.duration(d).unwrap(), span(0, 12));
    }

    #[test]
    fn empty_branch_duration_errors() {
        let store = TimelineStore::default();
        let d = store.create_decision("route", vec![Vec::new()]);
        assert_eq!(store.duration(d), Err(TimelineError::EmptyBranch));
        let none = store.create_decision("no branches", Vec::new());
        assert_eq!(store.duration(none), Err(TimelineError::EmptyBranch));
    }

    #[test]
    fn select_branch_out_of_range() {
        let store = TimelineStore::default();
        let a = store.create_activity("a", span(0, 1), Vec::new());
        let d = store.create_decision("route", vec![vec![a]]);
        assert_eq!(
            store.select_branch(d, 3),
            Err(TimelineError::OutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn strict_removal_refuses_referenced_node() {
        let store = TimelineStore::default();
        let child = store.create_activity("child", span(0, 1), Vec::new());
        let parent = store.create_activity("parent", span(0, 10), Vec::new());
        store
            .set_group(parent, "resource-activity", vec![child])
            .unwrap();
        assert_eq!(
            store.remove_node(child),
            Err(TimelineError::DanglingReference(child))
        );
        store
            .set_group(parent, "resource-activity", Vec::new())
            .unwrap();
        store.remove_node(child).unwrap();
        assert!(!store.contains(child));
    }

    #[test]
    fn cascade_removal_purges_groups_links_and_branches() {
        let store = TimelineStore::new(StoreConfig {
            removal: RemovalPolicy::Cascade,
            ..StoreConfig::default()
        });
        let victim = store.create_activity("victim", span(0, 1), Vec::new());
        let parent = store.create_activity("parent", span(0, 10), Vec::new());
        let linker = store.create_activity("linker", span(0, 2), Vec::new());
        let d = store.create_decision("route", vec![vec![victim]]);
        store
            .set_group(parent, "resource-activity", vec![victim])
            .unwrap();
        store.set_link(linker, Some(victim)).unwrap();
        store.remove_node(victim).unwrap();
        assert!(store.groups_of(parent).is_none());
        assert_eq!(store.link(linker), None);
        let decision = store.node(d).unwrap();
        assert!(decision.as_decision().unwrap().branches[0].is_empty());
    }

    #[test]
    fn edits_bump_ancestors_transitively() {
        let store = TimelineStore::default();
        let leaf = store.create_activity("leaf", span(0, 1), Vec::new());
        let mid = store.create_activity("mid", span(0, 5), Vec::new());
        let root = store.create_activity("root", span(0, 10), Vec::new());
        store.set_group(root, "resource-activity", vec![mid]).unwrap();
        store.set_group(mid, "resource-activity", vec![leaf]).unwrap();
        let root_rev = store.revision(root).unwrap();
        store.set_span(leaf, span(0, 2)).unwrap();
        assert!(store.revision(root).unwrap() > root_rev);
    }

    #[test]
    fn every_affected_ancestor_gets_an_invalidation_event() {
        let bus = Arc::new(MemoryEventBus::new(64));
        let telemetry = TimelineTelemetry::builder("timeline-store")
            .event_publisher(Arc::clone(&bus) as Arc<dyn EventPublisher>)
            .build()
            .unwrap();
        let store = TimelineStore::default().with_telemetry(telemetry);
        let child = store.create_activity("child", span(0, 1), Vec::new());
        let root = store.create_activity("root", span(0, 10), Vec::new());
        store
            .set_group(root, "resource-activity", vec![child])
            .unwrap();
        let before = bus.backlog().len();
        store.set_costs(child, vec![power(&[(0, 1.0), (1, 1.0)])]).unwrap();
        let events: Vec<_> = bus.backlog().into_iter().skip(before).collect();
        assert_eq!(events.len(), 2);
        let nodes: Vec<String> = events
            .iter()
            .map(|e| e.payload["node"].as_str().unwrap().to_string())
            .collect();
        assert!(nodes.contains(&child.to_string()));
        assert!(nodes.contains(&root.to_string()));
    }

    #[test]
    fn containment_policy_rejects_escaping_span() {
        let store = TimelineStore::new(StoreConfig {
            containment: ContainmentPolicy::Enforced,
            ..StoreConfig::default()
        });
        let child = store.create_activity("child", span(2, 8), Vec::new());
        let parent = store.create_activity("parent", span(0, 10), Vec::new());
        store
            .set_group(parent, "resource-activity", vec![child])
            .unwrap();
        assert!(matches!(
            store.set_span(child, span(2, 12)),
            Err(TimelineError::SpanOutsideParent { .. })
        ));
        assert_eq!(store.duration(child).unwrap(), span(2, 8));
        // Grouping an escaping child is rejected up front.
        let stray = store.create_activity("stray", span(5, 20), Vec::new());
        assert!(matches!(
            store.set_group(parent, "ground-event", vec![stray]),
            Err(TimelineError::SpanOutsideParent { .. })
        ));
    }

    #[test]
    fn set_branches_resets_dangling_selection() {
        let store = TimelineStore::default();
        let a = store.create_activity("a", span(0, 1), Vec::new());
        let b = store.create_activity("b", span(2, 3), Vec::new());
        let d = store.create_decision("route", vec![vec![a], vec![b]]);
        store.select_branch(d, 1).unwrap();
        store.set_branches(d, vec![vec![a]]).unwrap();
        assert_eq!(store.node(d).unwrap().as_decision().unwrap().selected, 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let store = TimelineStore::default();
        let a = store.create_activity("a", span(0, 10), Vec::new());
        let snapshot = store.snapshot();
        store.set_span(a, span(0, 20)).unwrap();
        assert_eq!(snapshot.duration(a).unwrap(), span(0, 10));
        assert_eq!(store.duration(a).unwrap(), span(0, 20));
    }
}
