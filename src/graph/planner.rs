use super::id::{ConnectionId, NodeId};
use super::plan::{EvalPlan, PlanStats, PlanStep, PlannedNode};
use super::tables::GraphTables;
use std::collections::HashMap;

/// Walks the graph backwards from Output into an [`EvalPlan`].
pub(crate) struct Planner;

impl Planner {
    /// Build the plan for the current tables.
    ///
    /// Depth-first from Output: for every slot, the producer's own slots are
    /// walked first (post-order), then the feeding connection is recorded.
    /// Each operator is expanded once; meeting an operator again (fan-out or a
    /// cycle) reuses its plan index without descending, so the plan has at
    /// most one entry per live operator and one step per live connection.
    ///
    /// Connections with a dead endpoint are skipped and reported in
    /// `EvalPlan::dangling`.
    pub(crate) fn plan(tables: &GraphTables) -> EvalPlan {
        let start_time = std::time::Instant::now();

        let mut dangling = Vec::new();
        let mut feeders: HashMap<(NodeId, usize), (ConnectionId, NodeId)> = HashMap::new();
        for (id, conn) in tables.connections.iter() {
            if tables.is_dangling(conn) {
                dangling.push(id);
                continue;
            }
            feeders
                .entry((conn.dest, conn.slot))
                .or_insert((id, conn.source));
        }

        let mut walk = Walk {
            tables,
            feeders: &feeders,
            index_of: HashMap::new(),
            nodes: Vec::new(),
            steps: Vec::new(),
        };
        if tables.nodes.contains(tables.output) {
            walk.visit(tables.output);
        }
        let Walk { nodes, steps, .. } = walk;

        let stats = PlanStats {
            live_nodes: tables.nodes.len(),
            planned_nodes: nodes.len(),
            steps: steps.len(),
            dangling: dangling.len(),
            plan_time_us: start_time.elapsed().as_micros() as u64,
        };

        EvalPlan {
            nodes,
            steps,
            output: 0,
            dangling,
            stats,
        }
    }
}

struct Walk<'t> {
    tables: &'t GraphTables,
    feeders: &'t HashMap<(NodeId, usize), (ConnectionId, NodeId)>,
    index_of: HashMap<NodeId, usize>,
    nodes: Vec<PlannedNode>,
    steps: Vec<PlanStep>,
}

impl Walk<'_> {
    fn visit(&mut self, id: NodeId) -> Option<usize> {
        if let Some(&index) = self.index_of.get(&id) {
            return Some(index);
        }
        let entry = self.tables.nodes.get(id)?;
        let slot_count = entry.connected.len();
        let index = self.nodes.len();
        self.index_of.insert(id, index);
        self.nodes.push(PlannedNode {
            id,
            operator: entry.operator.clone(),
            sources: vec![None; slot_count],
        });

        for slot in 0..slot_count {
            let Some(&(connection, source)) = self.feeders.get(&(id, slot)) else {
                continue;
            };
            let Some(source_index) = self.visit(source) else {
                continue;
            };
            self.nodes[index].sources[slot] = Some(source_index);
            self.steps.push(PlanStep {
                connection,
                source: source_index,
                dest: index,
                slot,
            });
        }
        Some(index)
    }
}
