//! Construction plans.
//!
//! A [`ConstructionPlan`] is the graph resolver's answer to "how is this
//! root built": an arena of [`ConstructionNode`]s addressed by [`NodeId`].
//! Singleton registrations appear once in the arena no matter how many
//! parents reach them, and each owns one [`SlotId`]. Transient nodes are
//! duplicated per occurrence. Children are always pushed before their
//! parents, so every edge points to a lower `NodeId`.

use std::fmt;
use std::sync::Arc;

use crate::constructor::{Constructor, Parameter};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::ServiceRegistration;

mod resolver;

pub use resolver::GraphResolver;

/// Index of a node in a [`ConstructionPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a singleton storage slot, unique within one plan and its factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot[{}]", self.0)
    }
}

/// Where a node's value comes from.
#[derive(Debug, Clone)]
pub enum NodeSource {
    /// Built by the selected constructor of a registration
    Registered {
        registration: Arc<ServiceRegistration>,
        constructor: Constructor,
    },
    /// Unregistered nested dependency, substituted with its default
    Defaulted(Parameter),
}

/// One step of a construction plan.
#[derive(Debug, Clone)]
pub struct ConstructionNode {
    pub(crate) service: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) args: Vec<NodeId>,
    pub(crate) slot: Option<SlotId>,
    pub(crate) source: NodeSource,
}

impl ConstructionNode {
    pub fn service(&self) -> &Key {
        &self.service
    }

    /// Defaulted nodes report `Transient`: they yield a fresh default per use.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn args(&self) -> &[NodeId] {
        &self.args
    }

    /// Present exactly for singleton nodes.
    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    pub fn source(&self) -> &NodeSource {
        &self.source
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self.source, NodeSource::Defaulted(_))
    }
}

/// Resolved plan for one root service.
#[derive(Debug, Clone)]
pub struct ConstructionPlan {
    pub(crate) nodes: Vec<ConstructionNode>,
    pub(crate) root: NodeId,
    /// Slot id -> owning node
    pub(crate) slots: Vec<NodeId>,
}

impl ConstructionPlan {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &ConstructionNode {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> &ConstructionNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[ConstructionNode] {
        &self.nodes
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_node(&self, slot: SlotId) -> NodeId {
        self.slots[slot.index()]
    }

    /// Singleton nodes with every dependency ahead of its dependents.
    ///
    /// Post-order over the DAG from the root; each singleton appears once.
    pub fn singleton_order(&self) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.slots.len());
        self.post_order(self.root, &mut visited, &mut order);
        order
    }

    fn post_order(&self, id: NodeId, visited: &mut [bool], order: &mut Vec<NodeId>) {
        if visited[id.index()] {
            return;
        }
        visited[id.index()] = true;
        let node = self.node(id);
        for &arg in &node.args {
            self.post_order(arg, visited, order);
        }
        if node.slot.is_some() {
            order.push(id);
        }
    }

    /// Constructor calls one evaluation of the root performs when no slot is filled yet.
    pub fn constructor_calls(&self) -> usize {
        let mut counted = vec![false; self.nodes.len()];
        self.count_calls(self.root, &mut counted)
    }

    fn count_calls(&self, id: NodeId, counted: &mut [bool]) -> usize {
        let node = self.node(id);
        if node.slot.is_some() {
            if counted[id.index()] {
                return 0;
            }
            counted[id.index()] = true;
        }
        let own = usize::from(!node.is_defaulted());
        own + node.args.iter().map(|&arg| self.count_calls(arg, counted)).sum::<usize>()
    }
}
