use indexmap::{IndexMap, IndexSet};
use uuid::Uuid;

/// Capability-indexed child associations and external links.
///
/// Per node, a set of named groups (capability tag to ordered child list,
/// duplicates allowed) plus at most one external link. The registry also
/// maintains the reverse-reference index used for invalidation and
/// dangling-reference checks; it performs no existence or cycle
/// validation itself.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    groups: IndexMap<Uuid, IndexMap<String, Vec<Uuid>>>,
    links: IndexMap<Uuid, Uuid>,
    branch_refs: IndexMap<Uuid, Vec<Uuid>>,
    /// target -> (referrer -> edge count); counted because the same
    /// referrer may reach a target through several groups, a link, and
    /// branch membership at once.
    referrers: IndexMap<Uuid, IndexMap<Uuid, usize>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All capability groups of a node, in insertion order.
    #[must_use]
    pub fn groups_of(&self, node: Uuid) -> Option<&IndexMap<String, Vec<Uuid>>> {
        self.groups.get(&node)
    }

    /// Ordered children under one capability tag.
    #[must_use]
    pub fn group(&self, node: Uuid, tag: &str) -> Option<&[Uuid]> {
        self.groups
            .get(&node)
            .and_then(|groups| groups.get(tag).map(Vec::as_slice))
    }

    /// Atomically replaces a group. An empty child list removes the tag;
    /// no empty-group entries persist.
    pub fn set_group(&mut self, node: Uuid, tag: impl Into<String>, children: Vec<Uuid>) {
        let tag = tag.into();
        let previous = if children.is_empty() {
            let removed = self
                .groups
                .get_mut(&node)
                .and_then(|groups| groups.shift_remove(&tag));
            if self.groups.get(&node).is_some_and(|groups| groups.is_empty()) {
                self.groups.shift_remove(&node);
            }
            removed
        } else {
            for &child in &children {
                self.add_edge(child, node);
            }
            self.groups
                .entry(node)
                .or_default()
                .insert(tag, children)
        };
        if let Some(previous) = previous {
            for child in previous {
                self.remove_edge(child, node);
            }
        }
    }

    /// External link target of a node, if any.
    #[must_use]
    pub fn link(&self, node: Uuid) -> Option<Uuid> {
        self.links.get(&node).copied()
    }

    /// Sets or clears the external link. Links may point anywhere,
    /// including back into the caller's own ancestry.
    pub fn set_link(&mut self, node: Uuid, target: Option<Uuid>) {
        let previous = match target {
            Some(target) => {
                self.add_edge(target, node);
                self.links.insert(node, target)
            }
            None => self.links.shift_remove(&node),
        };
        if let Some(previous) = previous {
            self.remove_edge(previous, node);
        }
    }

    /// Replaces the branch-membership references of a decision node.
    /// The store calls this whenever branch lists change so that branch
    /// members participate in the reverse index.
    pub fn set_branch_refs(&mut self, decision: Uuid, members: Vec<Uuid>) {
        for &member in &members {
            self.add_edge(member, decision);
        }
        let previous = if members.is_empty() {
            self.branch_refs.shift_remove(&decision)
        } else {
            self.branch_refs.insert(decision, members)
        };
        if let Some(previous) = previous {
            for member in previous {
                self.remove_edge(member, decision);
            }
        }
    }

    /// Whether anything still points at the node.
    #[must_use]
    pub fn is_referenced(&self, node: Uuid) -> bool {
        self.referrers
            .get(&node)
            .is_some_and(|refs| !refs.is_empty())
    }

    /// Direct referrers of a node.
    #[must_use]
    pub fn referrers_of(&self, node: Uuid) -> Vec<Uuid> {
        self.referrers
            .get(&node)
            .map(|refs| refs.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every node that reaches `node` through any chain of groups, links,
    /// or branch membership. Cycle-safe; excludes `node` itself unless it
    /// reaches itself through a cycle.
    #[must_use]
    pub fn transitive_referrers(&self, node: Uuid) -> IndexSet<Uuid> {
        let mut seen = IndexSet::new();
        let mut frontier = self.referrers_of(node);
        while let Some(current) = frontier.pop() {
            if seen.insert(current) {
                frontier.extend(self.referrers_of(current));
            }
        }
        seen
    }

    /// Drops all outgoing references of a removed node (its groups, link,
    /// and branch refs). Incoming references are the store's concern.
    pub fn remove_node(&mut self, node: Uuid) {
        if let Some(groups) = self.groups.shift_remove(&node) {
            for children in groups.into_values() {
                for child in children {
                    self.remove_edge(child, node);
                }
            }
        }
        self.set_link(node, None);
        self.set_branch_refs(node, Vec::new());
        self.referrers.shift_remove(&node);
    }

    /// Purges every group and link reference to `node`, returning the
    /// referrers whose entries changed. Used by cascade removal.
    pub fn purge_references_to(&mut self, node: Uuid) -> Vec<Uuid> {
        let referrers = self.referrers_of(node);
        for &referrer in &referrers {
            let mut removed_edges = 0;
            if let Some(groups) = self.groups.get_mut(&referrer) {
                let mut emptied = Vec::new();
                for (tag, children) in groups.iter_mut() {
                    let before = children.len();
                    children.retain(|&child| child != node);
                    removed_edges += before - children.len();
                    if children.is_empty() {
                        emptied.push(tag.clone());
                    }
                }
                for tag in emptied {
                    groups.shift_remove(&tag);
                }
                if groups.is_empty() {
                    self.groups.shift_remove(&referrer);
                }
            }
            for _ in 0..removed_edges {
                self.remove_edge(node, referrer);
            }
            if self.links.get(&referrer) == Some(&node) {
                self.set_link(referrer, None);
            }
        }
        referrers
    }

    fn add_edge(&mut self, target: Uuid, referrer: Uuid) {
        *self
            .referrers
            .entry(target)
            .or_default()
            .entry(referrer)
            .or_insert(0) += 1;
    }

    fn remove_edge(&mut self, target: Uuid, referrer: Uuid) {
        if let Some(refs) = self.referrers.get_mut(&target) {
            if let Some(count) = refs.get_mut(&referrer) {
                *count -= 1;
                if *count == 0 {
                    refs.shift_remove(&referrer);
                }
            }
            if refs.is_empty() {
                self.referrers.shift_remove(&target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_order_and_duplicates_are_preserved() {
        let mut registry = CapabilityRegistry::new();
        let parent = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.set_group(parent, "resource-activity", vec![a, b, a]);
        assert_eq!(
            registry.group(parent, "resource-activity"),
            Some([a, b, a].as_slice())
        );
    }

    #[test]
    fn empty_group_removes_the_tag() {
        let mut registry = CapabilityRegistry::new();
        let parent = Uuid::new_v4();
        let child = Uuid::new_v4();
        registry.set_group(parent, "ground-event", vec![child]);
        registry.set_group(parent, "ground-event", Vec::new());
        assert!(registry.groups_of(parent).is_none());
        assert!(!registry.is_referenced(child));
    }

    #[test]
    fn replacing_a_group_updates_reverse_index() {
        let mut registry = CapabilityRegistry::new();
        let parent = Uuid::new_v4();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        registry.set_group(parent, "resource-activity", vec![old]);
        registry.set_group(parent, "resource-activity", vec![new]);
        assert!(!registry.is_referenced(old));
        assert_eq!(registry.referrers_of(new), vec![parent]);
    }

    #[test]
    fn duplicate_edges_are_counted() {
        let mut registry = CapabilityRegistry::new();
        let parent = Uuid::new_v4();
        let child = Uuid::new_v4();
        registry.set_group(parent, "resource-activity", vec![child]);
        registry.set_link(parent, Some(child));
        registry.set_link(parent, None);
        // The group edge must survive dropping the link edge.
        assert!(registry.is_referenced(child));
    }

    #[test]
    fn transitive_referrers_climb_chains_and_tolerate_cycles() {
        let mut registry = CapabilityRegistry::new();
        let root = Uuid::new_v4();
        let mid = Uuid::new_v4();
        let leaf = Uuid::new_v4();
        registry.set_group(root, "resource-activity", vec![mid]);
        registry.set_group(mid, "resource-activity", vec![leaf]);
        registry.set_link(leaf, Some(root));
        let ancestors = registry.transitive_referrers(leaf);
        assert!(ancestors.contains(&mid));
        assert!(ancestors.contains(&root));
        // Cycle back through the link reaches leaf itself; must terminate.
        assert!(registry.transitive_referrers(root).contains(&leaf));
    }

    #[test]
    fn purge_clears_groups_and_links() {
        let mut registry = CapabilityRegistry::new();
        let parent = Uuid::new_v4();
        let linker = Uuid::new_v4();
        let target = Uuid::new_v4();
        registry.set_group(parent, "resource-activity", vec![target, target]);
        registry.set_link(linker, Some(target));
        let touched = registry.purge_references_to(target);
        assert_eq!(touched.len(), 2);
        assert!(!registry.is_referenced(target));
        assert!(registry.groups_of(parent).is_none());
        assert_eq!(registry.link(linker), None);
    }
}
