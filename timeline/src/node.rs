use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cost::CostSeries;
use crate::span::TimeSpan;

/// Time-bound leaf-style node carrying its own cost samples.
///
/// Children (capability groups) and the external link live in the
/// [`crate::registry::CapabilityRegistry`], keyed by this node's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityNode {
    /// Node identity.
    pub id: Uuid,
    /// Operator-facing name.
    pub display_name: String,
    /// Scheduled interval.
    pub span: TimeSpan,
    /// Own cost samples, one series per dimension.
    pub own_costs: IndexMap<String, CostSeries>,
}

impl ActivityNode {
    /// Creates an activity with a fresh id. Later series for a repeated
    /// dimension replace earlier ones.
    #[must_use]
    pub fn new(display_name: impl Into<String>, span: TimeSpan, costs: Vec<CostSeries>) -> Self {
        let mut own_costs = IndexMap::new();
        for series in costs {
            own_costs.insert(series.dimension.clone(), series);
        }
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            span,
            own_costs,
        }
    }
}

/// Branching node choosing exactly one of several candidate activity
/// chains as the committed plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Node identity.
    pub id: Uuid,
    /// Operator-facing name.
    pub display_name: String,
    /// Candidate chains, each an ordered sequence of member node ids.
    pub branches: Vec<Vec<Uuid>>,
    /// Index of the committed branch. Meaningless while `branches` is empty.
    pub selected: usize,
}

impl DecisionNode {
    /// Creates a decision with a fresh id; the first branch starts selected.
    #[must_use]
    pub fn new(display_name: impl Into<String>, branches: Vec<Vec<Uuid>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            branches,
            selected: 0,
        }
    }

    /// Members of the committed branch; `None` while there are no branches.
    #[must_use]
    pub fn selected_branch(&self) -> Option<&[Uuid]> {
        self.branches.get(self.selected).map(Vec::as_slice)
    }

    /// All branch members flattened, for reverse-reference bookkeeping.
    #[must_use]
    pub fn all_members(&self) -> Vec<Uuid> {
        self.branches.iter().flatten().copied().collect()
    }
}

/// Any node living in the timeline store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TimelineNode {
    /// Time-bound activity.
    Activity(ActivityNode),
    /// Branching decision.
    Decision(DecisionNode),
}

impl TimelineNode {
    /// Node identity.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Activity(node) => node.id,
            Self::Decision(node) => node.id,
        }
    }

    /// Operator-facing name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Activity(node) => &node.display_name,
            Self::Decision(node) => &node.display_name,
        }
    }

    /// Activity view of the node, if it is one.
    #[must_use]
    pub const fn as_activity(&self) -> Option<&ActivityNode> {
        match self {
            Self::Activity(node) => Some(node),
            Self::Decision(_) => None,
        }
    }

    /// Decision view of the node, if it is one.
    #[must_use]
    pub const fn as_decision(&self) -> Option<&DecisionNode> {
        match self {
            Self::Activity(_) => None,
            Self::Decision(node) => Some(node),
        }
    }
}
