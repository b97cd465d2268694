//! Evaluation plan for one pass, built from the tables under the lock.
//!
//! Operators are referenced by dense plan indices; `steps` lists the
//! reachable connections with every producer's inputs ahead of the
//! connection that carries its value onward.

use super::id::{ConnectionId, NodeId};
use super::operator::AnyOperator;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PlannedNode {
    pub id: NodeId,
    /// Snapshot of the operator at planning time.
    pub operator: Arc<AnyOperator>,
    /// Plan index of the producer feeding each slot.
    pub sources: Vec<Option<usize>>,
}

/// One walked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanStep {
    pub connection: ConnectionId,
    pub source: usize,
    pub dest: usize,
    pub slot: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EvalPlan {
    /// Operators reachable from Output, in discovery order.
    pub nodes: Vec<PlannedNode>,
    /// Connections in execution order.
    pub steps: Vec<PlanStep>,
    /// Plan index of the Output operator. Always 0 for a non-empty plan.
    pub output: usize,
    /// Connections found with a dead endpoint; removed by the caller.
    pub dangling: Vec<ConnectionId>,
    pub stats: PlanStats,
}

/// Statistics about the plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Live operators in the graph
    pub live_nodes: usize,
    /// Operators reachable from Output
    pub planned_nodes: usize,
    /// Connections walked
    pub steps: usize,
    /// Connections found dangling
    pub dangling: usize,
    /// Planning time in microseconds
    pub plan_time_us: u64,
}

impl EvalPlan {
    /// Check if the plan has no operators
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}
