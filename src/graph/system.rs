//! The node system: graph tables, mutation API and evaluation entry point.
//!
//! All methods take `&self`. Table mutations and the pruning phase of a pass
//! run under one mutex; the pixel loop runs on a plan snapshot outside it, so
//! a long `process` call never blocks edits for its whole duration.
//!
//! Lock order is capture state before tables.

use super::error::{GraphError, GraphResult};
use super::evaluator::{EvalMode, Evaluator};
use super::id::{ConnectionId, NodeId, MAX_TABLE_CAPACITY};
use super::kind::OperatorKind;
use super::operator::{AnyOperator, BuiltinOperator};
use super::planner::Planner;
use super::snapshot::{ConnectionSnapshot, NodeSnapshot, PassStats, SlotSnapshot, TopologySnapshot};
use super::tables::{Connection, GraphTables};
use crate::capture::{CameraFeed, CaptureBackend, CaptureProducer};
use crate::config::EngineConfig;
use crate::image::PixelBuffer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

struct CaptureState {
    backend: Option<Arc<dyn CaptureBackend>>,
    enabled: bool,
    poll_rate_hz: u32,
    producer: Option<CaptureProducer>,
}

/// Owner of every operator and connection in one graph.
///
/// # Example
///
/// ```
/// use pixelgraph::graph::{NodeSystem, operators::ConstantColorOp};
/// use pixelgraph::image::Color;
///
/// let system = NodeSystem::default();
/// let red = system.create(ConstantColorOp::new(Color::rgb(1.0, 0.0, 0.0)));
/// system.connect(red, system.output(), 0);
///
/// let image = system.process(2, 2);
/// assert!(image.pixels().iter().all(|&p| p == Color::rgb(1.0, 0.0, 0.0)));
/// ```
pub struct NodeSystem {
    tables: Mutex<GraphTables>,
    capture: Mutex<CaptureState>,
    camera: CameraFeed,
    eval_mode: EvalMode,
    last_pass: Mutex<Option<PassStats>>,
}

impl NodeSystem {
    pub fn new(config: &EngineConfig) -> Self {
        let capacity = config.graph.node_capacity.clamp(1, MAX_TABLE_CAPACITY / 2);
        if capacity != config.graph.node_capacity {
            tracing::warn!(
                requested = config.graph.node_capacity,
                capacity,
                "Node capacity out of range, clamped"
            );
        }

        Self {
            tables: Mutex::new(GraphTables::new(capacity)),
            capture: Mutex::new(CaptureState {
                backend: None,
                enabled: config.capture.enabled,
                poll_rate_hz: config.capture.poll_rate_hz,
                producer: None,
            }),
            camera: CameraFeed::new(),
            eval_mode: config.graph.eval_mode,
            last_pass: Mutex::new(None),
        }
    }

    /// System that opens `backend` when the first camera source is created.
    pub fn with_capture_backend(config: &EngineConfig, backend: Arc<dyn CaptureBackend>) -> Self {
        let system = Self::new(config);
        system.lock_capture().backend = Some(backend);
        system
    }

    /// Install or remove the capture backend. A running producer is restarted
    /// on the new backend if camera sources exist.
    pub fn set_capture_backend(&self, backend: Option<Arc<dyn CaptureBackend>>) {
        {
            let mut capture = self.lock_capture();
            if let Some(mut producer) = capture.producer.take() {
                producer.stop();
            }
            capture.backend = backend;
        }
        self.sync_capture();
    }

    fn lock_tables(&self) -> MutexGuard<'_, GraphTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_capture(&self) -> MutexGuard<'_, CaptureState> {
        self.capture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Mutation ====================

    /// Add an operator, reporting why it was refused.
    pub fn try_create(&self, operator: impl Into<AnyOperator>) -> GraphResult<NodeId> {
        let operator = operator.into();
        let kind = operator.kind();
        let id = self.lock_tables().insert_node(operator)?;
        tracing::debug!(?id, %kind, "Created operator");

        if kind == OperatorKind::CameraSource {
            self.sync_capture();
        }
        Ok(id)
    }

    /// Add an operator. Returns [`NodeId::INVALID`] if the table is full or a
    /// second Output was requested.
    pub fn create(&self, operator: impl Into<AnyOperator>) -> NodeId {
        self.try_create(operator).unwrap_or_else(|e| {
            tracing::debug!("Create rejected: {}", e);
            NodeId::INVALID
        })
    }

    /// Add a built-in operator of `kind` with default parameters.
    pub fn create_default(&self, kind: OperatorKind) -> NodeId {
        match BuiltinOperator::with_defaults(kind) {
            Some(op) => self.create(op),
            None => NodeId::INVALID,
        }
    }

    /// Remove an operator and every connection touching it.
    ///
    /// Returns `false` for stale handles and for the Output operator.
    pub fn destroy(&self, id: NodeId) -> bool {
        let kind = {
            let mut tables = self.lock_tables();
            if id == tables.output {
                return false;
            }
            let Some(kind) = tables.nodes.get(id).map(|e| e.operator.kind()) else {
                return false;
            };
            let removed = tables.remove_node(id).unwrap_or_default();
            tracing::debug!(?id, %kind, connections = removed.len(), "Destroyed operator");
            kind
        };

        if kind == OperatorKind::CameraSource {
            self.sync_capture();
        }
        true
    }

    /// Remove every operator and connection, then recreate Output.
    pub fn clear(&self) {
        {
            let mut capture = self.lock_capture();
            if let Some(mut producer) = capture.producer.take() {
                producer.stop();
                tracing::info!("Capture stopped");
            }
            self.lock_tables().reset();
        }
        self.camera.reset();
        *self.last_pass.lock().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Graph cleared");
    }

    /// Connect the output of `source` into `slot` of `dest`, reporting why
    /// the connection was refused.
    pub fn try_connect(
        &self,
        source: NodeId,
        dest: NodeId,
        slot: usize,
    ) -> GraphResult<ConnectionId> {
        let id = self.lock_tables().insert_connection(source, dest, slot)?;
        tracing::debug!(?id, ?source, ?dest, slot, "Connected");
        Ok(id)
    }

    /// Connect, returning [`ConnectionId::INVALID`] on failure. An occupied
    /// slot keeps its existing connection.
    pub fn connect(&self, source: NodeId, dest: NodeId, slot: usize) -> ConnectionId {
        self.try_connect(source, dest, slot).unwrap_or_else(|e| {
            tracing::debug!("Connect rejected: {}", e);
            ConnectionId::INVALID
        })
    }

    /// Remove a connection. Returns `false` for stale handles.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.lock_tables().remove_connection(id).is_some();
        if removed {
            tracing::debug!(?id, "Disconnected");
        }
        removed
    }

    /// Modify the parameters of a live operator.
    ///
    /// The edit is applied to a copy, so a pass already running keeps the
    /// parameters it was planned with. Changing the operator's kind is
    /// rejected and leaves the operator untouched. If the edit removes slots
    /// (a script declaring fewer inputs), connections into them are dropped.
    pub fn edit<R>(&self, id: NodeId, f: impl FnOnce(&mut AnyOperator) -> R) -> GraphResult<R> {
        let mut tables = self.lock_tables();
        let entry = tables.nodes.get(id).ok_or(GraphError::InvalidNode(id))?;

        let from = entry.operator.kind();
        let mut edited = (*entry.operator).clone();
        let result = f(&mut edited);
        let to = edited.kind();
        if to != from {
            return Err(GraphError::KindChanged { node: id, from, to });
        }
        let cut = tables
            .replace_operator(id, edited)
            .ok_or(GraphError::InvalidNode(id))?;
        if !cut.is_empty() {
            tracing::debug!(?id, removed = cut.len(), "Edit dropped connections into removed slots");
        }
        Ok(result)
    }

    // ==================== Evaluation ====================

    /// Evaluate the graph at `width x height` in the configured mode.
    pub fn process(&self, width: usize, height: usize) -> PixelBuffer {
        self.process_with(self.eval_mode, width, height)
    }

    /// Evaluate at half resolution, for interactive previews.
    pub fn process_preview(&self, width: usize, height: usize) -> PixelBuffer {
        self.process((width / 2).max(1), (height / 2).max(1))
    }

    /// Evaluate the graph at `width x height` in `mode`.
    pub fn process_with(&self, mode: EvalMode, width: usize, height: usize) -> PixelBuffer {
        let start_time = Instant::now();

        let plan = {
            let mut tables = self.lock_tables();
            let plan = Planner::plan(&tables);
            for &id in &plan.dangling {
                tables.remove_connection(id);
            }
            plan
        };
        if !plan.dangling.is_empty() {
            tracing::debug!(pruned = plan.dangling.len(), "Pruned dangling connections");
        }

        let camera = self.camera.latest();
        let mut evaluator = Evaluator::new(&plan, &camera);
        let image = evaluator.run(mode, width, height);

        let stats = PassStats {
            width,
            height,
            operators: plan.stats.planned_nodes,
            connections: plan.stats.steps,
            pruned: plan.stats.dangling,
            invocations: evaluator.invocations(),
            elapsed_us: start_time.elapsed().as_micros() as u64,
        };
        tracing::trace!(?mode, ?stats, "Pass complete");
        *self.last_pass.lock().unwrap_or_else(PoisonError::into_inner) = Some(stats);

        image
    }

    pub fn eval_mode(&self) -> EvalMode {
        self.eval_mode
    }

    /// Statistics of the most recent pass, if any since the last clear.
    pub fn last_pass_stats(&self) -> Option<PassStats> {
        *self.last_pass.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Queries ====================

    /// The Output operator.
    pub fn output(&self) -> NodeId {
        self.lock_tables().output
    }

    /// Live operators in slot order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.lock_tables().nodes.handles()
    }

    /// Live connections in slot order.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.lock_tables().connections.handles()
    }

    pub fn node_count(&self) -> usize {
        self.lock_tables().nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.lock_tables().connections.len()
    }

    /// `(operators, connections)` table capacities.
    pub fn capacity(&self) -> (usize, usize) {
        let tables = self.lock_tables();
        (tables.nodes.capacity(), tables.connections.capacity())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.lock_tables().nodes.contains(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<Connection> {
        self.lock_tables().connections.get(id).copied()
    }

    /// The connection feeding `slot` of `dest`.
    pub fn connection_into(&self, dest: NodeId, slot: usize) -> Option<ConnectionId> {
        self.lock_tables().feeding(dest, slot)
    }

    pub fn find_connection(&self, source: NodeId, dest: NodeId, slot: usize) -> Option<ConnectionId> {
        let tables = self.lock_tables();
        tables
            .feeding(dest, slot)
            .filter(|&id| tables.connections.get(id).is_some_and(|c| c.source == source))
    }

    /// Every connection from `source` into any slot of `dest`.
    pub fn connections_between(&self, source: NodeId, dest: NodeId) -> Vec<ConnectionId> {
        self.lock_tables()
            .connections
            .iter()
            .filter(|(_, c)| c.source == source && c.dest == dest)
            .map(|(id, _)| id)
            .collect()
    }

    /// Connections with `node` as either endpoint.
    pub fn connections_touching(&self, node: NodeId) -> Vec<ConnectionId> {
        self.lock_tables().touching(node)
    }

    pub fn kind(&self, id: NodeId) -> Option<OperatorKind> {
        self.lock_tables().nodes.get(id).map(|e| e.operator.kind())
    }

    pub fn slot_count(&self, id: NodeId) -> Option<usize> {
        self.lock_tables().nodes.get(id).map(|e| e.operator.slot_count())
    }

    pub fn slot_name(&self, id: NodeId, slot: usize) -> Option<String> {
        self.lock_tables()
            .nodes
            .get(id)
            .and_then(|e| e.operator.slot_name(slot).map(str::to_string))
    }

    pub fn is_slot_connected(&self, id: NodeId, slot: usize) -> bool {
        self.lock_tables()
            .nodes
            .get(id)
            .and_then(|e| e.connected.get(slot).copied())
            .unwrap_or(false)
    }

    /// Shared handle to the operator's current parameters.
    pub fn operator(&self, id: NodeId) -> Option<Arc<AnyOperator>> {
        self.lock_tables().nodes.get(id).map(|e| e.operator.clone())
    }

    /// Nodes, connections and last-pass statistics for display.
    pub fn topology(&self) -> TopologySnapshot {
        let last_pass = self.last_pass_stats();
        let tables = self.lock_tables();

        let nodes = tables
            .nodes
            .iter()
            .map(|(id, entry)| NodeSnapshot {
                id,
                kind: entry.operator.kind(),
                name: entry.operator.name().to_string(),
                slots: entry
                    .operator
                    .slots()
                    .iter()
                    .zip(&entry.connected)
                    .map(|(slot, &connected)| SlotSnapshot {
                        name: slot.name.to_string(),
                        connected,
                    })
                    .collect(),
            })
            .collect();

        let connections = tables
            .connections
            .iter()
            .map(|(id, c)| ConnectionSnapshot {
                id,
                source: c.source,
                dest: c.dest,
                slot: c.slot,
            })
            .collect();

        TopologySnapshot {
            nodes,
            connections,
            last_pass,
        }
    }

    // ==================== Camera ====================

    /// The camera frame the last pass used.
    pub fn camera_frame(&self) -> Arc<PixelBuffer> {
        self.camera.current()
    }

    /// Whether the capture thread posted a frame no pass has consumed yet.
    pub fn has_new_frame(&self) -> bool {
        self.camera.has_new_frame()
    }

    pub fn is_capturing(&self) -> bool {
        self.lock_capture()
            .producer
            .as_ref()
            .is_some_and(CaptureProducer::is_running)
    }

    /// Start the producer if a camera source exists, stop it if none does.
    fn sync_capture(&self) {
        let mut capture = self.lock_capture();
        let cameras = self.lock_tables().count_kind(OperatorKind::CameraSource);

        if cameras == 0 {
            if let Some(mut producer) = capture.producer.take() {
                producer.stop();
                tracing::info!("Capture stopped");
            }
            return;
        }
        if capture.producer.is_some() || !capture.enabled {
            return;
        }
        let Some(backend) = capture.backend.clone() else {
            return;
        };

        match CaptureProducer::start(backend.as_ref(), self.camera.mailbox(), capture.poll_rate_hz) {
            Ok(producer) => capture.producer = Some(producer),
            Err(e) => tracing::warn!("Failed to start capture on {}: {}", backend.name(), e),
        }
    }
}

impl Default for NodeSystem {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MockCaptureBackend, MockFramePattern};
    use crate::graph::operators::{AddOp, ConstantColorOp, MirrorOp, ThresholdOp};
    use crate::image::Color;

    fn small_config(capacity: usize) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.graph.node_capacity = capacity;
        config
    }

    #[test]
    fn test_new_system_holds_only_output() {
        let system = NodeSystem::default();
        assert_eq!(system.nodes(), vec![system.output()]);
        assert_eq!(system.kind(system.output()), Some(OperatorKind::Output));
        assert_eq!(system.slot_count(system.output()), Some(1));
        assert_eq!(system.capacity(), (128, 256));
    }

    #[test]
    fn test_output_cannot_be_destroyed_or_duplicated() {
        let system = NodeSystem::default();
        let output = system.output();
        assert!(!system.destroy(output));
        assert!(system.contains(output));
        assert_eq!(
            system.try_create(BuiltinOperator::with_defaults(OperatorKind::Output).unwrap()),
            Err(GraphError::OutputExists(OperatorKind::Output))
        );
        assert_eq!(system.create_default(OperatorKind::Output), NodeId::INVALID);
    }

    #[test]
    fn test_create_fails_when_full() {
        let system = NodeSystem::new(&small_config(3));
        assert!(system.create_default(OperatorKind::Invert).is_valid());
        assert!(system.create_default(OperatorKind::Invert).is_valid());
        assert_eq!(system.create_default(OperatorKind::Invert), NodeId::INVALID);
        assert!(matches!(
            system.try_create(AddOp),
            Err(GraphError::NodeTableFull { capacity: 3 })
        ));
    }

    #[test]
    fn test_clear_recreates_output() {
        let system = NodeSystem::default();
        let old_output = system.output();
        let c = system.create(ConstantColorOp::new(Color::WHITE));
        system.connect(c, old_output, 0);
        system.process(1, 1);

        system.clear();
        assert_eq!(system.node_count(), 1);
        assert_eq!(system.connection_count(), 0);
        assert!(!system.contains(c));
        assert_ne!(system.output(), old_output);
        assert!(system.last_pass_stats().is_none());
        assert_eq!(system.process(1, 1).get(0, 0), Color::DEFAULT);
    }

    #[test]
    fn test_edit_updates_parameters() {
        let system = NodeSystem::default();
        let t = system.create(ThresholdOp::default());
        system
            .edit(t, |op| {
                if let Some(BuiltinOperator::Threshold(th)) = op.as_builtin_mut() {
                    th.threshold = 0.0;
                }
            })
            .unwrap();
        system.connect(t, system.output(), 0);
        // Luma 0 >= 0 is white
        assert_eq!(system.process(1, 1).get(0, 0), Color::WHITE);
    }

    #[test]
    fn test_edit_rejects_kind_change() {
        let system = NodeSystem::default();
        let m = system.create(MirrorOp::default());
        let result = system.edit(m, |op| *op = AddOp.into());
        assert!(matches!(result, Err(GraphError::KindChanged { .. })));
        assert_eq!(system.kind(m), Some(OperatorKind::Mirror));
        assert!(matches!(
            system.edit(NodeId::INVALID, |_| ()),
            Err(GraphError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_dangling_connection_pruned_on_process() {
        let system = NodeSystem::default();
        let c = system.create(ConstantColorOp::new(Color::WHITE));
        let conn = system.connect(c, system.output(), 0);

        // Simulate an endpoint vanishing without the connection being removed
        system.lock_tables().nodes.vacate_unchecked(c);
        assert!(system.connection(conn).is_some());

        let image = system.process(2, 2);
        assert!(image.pixels().iter().all(|&p| p == Color::DEFAULT));
        assert!(system.connection(conn).is_none());
        assert_eq!(system.last_pass_stats().unwrap().pruned, 1);
    }

    #[test]
    fn test_preview_is_half_resolution() {
        let system = NodeSystem::default();
        assert_eq!(system.process_preview(9, 4).width(), 4);
        assert_eq!(system.process_preview(1, 1).height(), 1);
    }

    #[test]
    fn test_topology_reports_slots() {
        let system = NodeSystem::default();
        let a = system.create(ConstantColorOp::default());
        let add = system.create(AddOp);
        system.connect(a, add, 1);

        let topo = system.topology();
        assert_eq!(topo.nodes.len(), 3);
        let add_snapshot = topo.node(add).unwrap();
        assert_eq!(add_snapshot.kind, OperatorKind::Add);
        assert_eq!(
            add_snapshot.slots.iter().map(|s| s.connected).collect::<Vec<_>>(),
            vec![false, true]
        );
        assert_eq!(topo.inputs_of(add).len(), 1);
    }

    #[test]
    fn test_capture_follows_camera_sources() {
        let backend = Arc::new(MockCaptureBackend::new(MockFramePattern::Solid([0, 255, 0]), 2, 2));
        let system = NodeSystem::with_capture_backend(&EngineConfig::default(), backend.clone());
        assert!(!system.is_capturing());

        let cam1 = system.create_default(OperatorKind::CameraSource);
        let cam2 = system.create_default(OperatorKind::CameraSource);
        assert!(system.is_capturing());
        assert_eq!(backend.open_count(), 1);

        system.destroy(cam1);
        assert!(system.is_capturing());
        system.destroy(cam2);
        assert!(!system.is_capturing());
    }

    #[test]
    fn test_capture_disabled_by_config() {
        let mut config = EngineConfig::default();
        config.capture.enabled = false;
        let backend = Arc::new(MockCaptureBackend::default());
        let system = NodeSystem::with_capture_backend(&config, backend.clone());
        system.create_default(OperatorKind::CameraSource);
        assert!(!system.is_capturing());
        assert_eq!(backend.open_count(), 0);
    }
}
