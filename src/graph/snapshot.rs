//! Read-only views of the graph for display layers.

use super::id::{ConnectionId, NodeId};
use super::kind::OperatorKind;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub name: String,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: OperatorKind,
    pub name: String,
    pub slots: Vec<SlotSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub source: NodeId,
    pub dest: NodeId,
    pub slot: usize,
}

/// Statistics of one `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub width: usize,
    pub height: usize,
    /// Operators reachable from Output
    pub operators: usize,
    /// Connections walked per pixel
    pub connections: usize,
    /// Dangling connections removed before the pass
    pub pruned: usize,
    /// Operator `sample` calls (per-pixel) or operators rendered (per-image)
    pub invocations: u64,
    pub elapsed_us: u64,
}

/// Everything a canvas needs to draw the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
    pub last_pass: Option<PassStats>,
}

impl TopologySnapshot {
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Connections whose destination is `id`, in slot order.
    pub fn inputs_of(&self, id: NodeId) -> Vec<ConnectionSnapshot> {
        let mut inputs: Vec<_> = self
            .connections
            .iter()
            .filter(|c| c.dest == id)
            .copied()
            .collect();
        inputs.sort_by_key(|c| c.slot);
        inputs
    }
}
