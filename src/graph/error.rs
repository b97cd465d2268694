//! Graph-specific error types.
//!
//! These are the precise reasons behind the sentinel handles returned by
//! `NodeSystem::create` and `NodeSystem::connect`. None of them is fatal.

use crate::graph::id::NodeId;
use crate::graph::kind::OperatorKind;
use thiserror::Error;

/// Errors that can occur while mutating the node graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Operator table is full (capacity {capacity})")]
    NodeTableFull { capacity: usize },

    #[error("Connection table is full (capacity {capacity})")]
    ConnectionTableFull { capacity: usize },

    #[error("Node {0:?} is not live")]
    InvalidNode(NodeId),

    #[error("Slot {slot} of {node:?} is already connected")]
    SlotOccupied { node: NodeId, slot: usize },

    #[error("Slot {slot} is out of range for {node:?} ({slot_count} slots)")]
    SlotOutOfRange {
        node: NodeId,
        slot: usize,
        slot_count: usize,
    },

    #[error("Cannot create another {0} operator")]
    OutputExists(OperatorKind),

    #[error("Edit changed {node:?} from {from} to {to}")]
    KindChanged {
        node: NodeId,
        from: OperatorKind,
        to: OperatorKind,
    },

    #[error("Document references unknown node index {0}")]
    UnknownDocumentNode(usize),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
