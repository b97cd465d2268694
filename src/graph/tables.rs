//! Operator and connection tables.
//!
//! `GraphTables` is the state guarded by the `NodeSystem` lock. Every method
//! leaves the tables consistent: a live connection always has live endpoints
//! and its destination slot flagged as connected.

use super::arena::SlotTable;
use super::error::{GraphError, GraphResult};
use super::id::{ConnectionId, NodeId};
use super::kind::OperatorKind;
use super::operator::AnyOperator;
use super::operators::OutputOp;
use std::sync::Arc;

/// A directed edge from one operator's output into one slot of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub source: NodeId,
    pub dest: NodeId,
    pub slot: usize,
}

pub(crate) struct NodeEntry {
    /// Shared with in-flight passes; an edit swaps in a new `Arc`.
    pub operator: Arc<AnyOperator>,
    /// Per-slot connected flag.
    pub connected: Vec<bool>,
}

impl NodeEntry {
    fn new(operator: AnyOperator) -> Self {
        let connected = vec![false; operator.slot_count()];
        Self {
            operator: Arc::new(operator),
            connected,
        }
    }
}

pub(crate) struct GraphTables {
    pub nodes: SlotTable<NodeId, NodeEntry>,
    pub connections: SlotTable<ConnectionId, Connection>,
    pub output: NodeId,
}

impl GraphTables {
    /// Tables for `node_capacity` operators and twice as many connections,
    /// holding a fresh Output operator.
    pub fn new(node_capacity: usize) -> Self {
        let mut tables = Self {
            nodes: SlotTable::with_capacity(node_capacity),
            connections: SlotTable::with_capacity(node_capacity * 2),
            output: NodeId::INVALID,
        };
        tables.install_output();
        tables
    }

    fn install_output(&mut self) {
        self.output = self
            .nodes
            .insert(NodeEntry::new(OutputOp.into()))
            .unwrap_or(NodeId::INVALID);
    }

    /// Drop everything and recreate the Output operator.
    pub fn reset(&mut self) {
        self.connections.clear();
        self.nodes.clear();
        self.install_output();
    }

    pub fn insert_node(&mut self, operator: AnyOperator) -> GraphResult<NodeId> {
        if operator.kind() == OperatorKind::Output && self.nodes.contains(self.output) {
            return Err(GraphError::OutputExists(OperatorKind::Output));
        }
        self.nodes
            .insert(NodeEntry::new(operator))
            .ok_or(GraphError::NodeTableFull {
                capacity: self.nodes.capacity(),
            })
    }

    /// Remove `node` and every connection touching it.
    ///
    /// Returns the removed connections, or `None` if `node` was not live.
    pub fn remove_node(&mut self, node: NodeId) -> Option<Vec<ConnectionId>> {
        if !self.nodes.contains(node) {
            return None;
        }
        let touching = self.touching(node);
        for &id in &touching {
            self.remove_connection(id);
        }
        self.nodes.remove(node);
        Some(touching)
    }

    pub fn insert_connection(
        &mut self,
        source: NodeId,
        dest: NodeId,
        slot: usize,
    ) -> GraphResult<ConnectionId> {
        if self.connections.is_full() {
            return Err(GraphError::ConnectionTableFull {
                capacity: self.connections.capacity(),
            });
        }
        if !self.nodes.contains(source) {
            return Err(GraphError::InvalidNode(source));
        }
        let entry = self.nodes.get(dest).ok_or(GraphError::InvalidNode(dest))?;
        let slot_count = entry.connected.len();
        if slot >= slot_count {
            return Err(GraphError::SlotOutOfRange {
                node: dest,
                slot,
                slot_count,
            });
        }
        if self.feeding(dest, slot).is_some() {
            return Err(GraphError::SlotOccupied { node: dest, slot });
        }

        let id = self
            .connections
            .insert(Connection { source, dest, slot })
            .ok_or(GraphError::ConnectionTableFull {
                capacity: self.connections.capacity(),
            })?;
        if let Some(entry) = self.nodes.get_mut(dest) {
            entry.connected[slot] = true;
        }
        Ok(id)
    }

    /// Remove a connection, clearing its destination's connected flag.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let conn = self.connections.remove(id)?;
        if let Some(flag) = self
            .nodes
            .get_mut(conn.dest)
            .and_then(|entry| entry.connected.get_mut(conn.slot))
        {
            *flag = false;
        }
        Some(conn)
    }

    /// The connection feeding `(dest, slot)`, if any.
    pub fn feeding(&self, dest: NodeId, slot: usize) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|(_, c)| c.dest == dest && c.slot == slot)
            .map(|(id, _)| id)
    }

    /// Connections with `node` as source or destination.
    pub fn touching(&self, node: NodeId) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, c)| c.source == node || c.dest == node)
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether an endpoint of `conn` no longer resolves to a live operator
    /// with the addressed slot.
    pub fn is_dangling(&self, conn: &Connection) -> bool {
        if !self.nodes.contains(conn.source) {
            return true;
        }
        match self.nodes.get(conn.dest) {
            Some(entry) => conn.slot >= entry.connected.len(),
            None => true,
        }
    }

    /// Swap in an edited operator for `node`, resizing its slot flags.
    ///
    /// Connections into slots the new operator no longer has are removed and
    /// returned. `None` if `node` is not live.
    pub fn replace_operator(
        &mut self,
        node: NodeId,
        operator: AnyOperator,
    ) -> Option<Vec<ConnectionId>> {
        if !self.nodes.contains(node) {
            return None;
        }
        let slot_count = operator.slot_count();
        let cut: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, c)| c.dest == node && c.slot >= slot_count)
            .map(|(id, _)| id)
            .collect();
        for &id in &cut {
            self.remove_connection(id);
        }
        let entry = self.nodes.get_mut(node)?;
        entry.operator = Arc::new(operator);
        entry.connected.resize(slot_count, false);
        Some(cut)
    }

    pub fn count_kind(&self, kind: OperatorKind) -> usize {
        self.nodes
            .iter()
            .filter(|(_, entry)| entry.operator.kind() == kind)
            .count()
    }
}
