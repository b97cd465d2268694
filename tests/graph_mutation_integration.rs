//! Integration tests for graph mutation
//!
//! These tests validate the NodeSystem mutation API:
//! - Slot exclusivity and connection validation
//! - Cleanup of connections when operators are destroyed
//! - Capacity limits and stale handles
//! - Script edits that change the slot layout
//! - Query helpers and document persistence

mod common;

use common::assert_uniform;
use common::builders::{coordinate_image, ChainBuilder};
use pixelgraph::graph::operators::{
    AddOp, ConstantColorOp, ImageSourceOp, InvertOp, MirrorOp, MixOp, ScriptOp, ThresholdOp,
};
use pixelgraph::graph::{
    BuiltinOperator, ConnectionId, GraphDocument, GraphError, NodeId, NodeSystem, OperatorKind,
};
use pixelgraph::image::Color;
use pixelgraph::{EngineConfig, PixelGraphError};
use std::sync::Arc;
use tempfile::TempDir;

fn system_with_capacity(capacity: usize) -> NodeSystem {
    let mut config = EngineConfig::default();
    config.graph.node_capacity = capacity;
    NodeSystem::new(&config)
}

#[test]
fn test_slot_exclusivity() {
    let system = NodeSystem::default();
    let a = system.create(ConstantColorOp::new(Color::WHITE));
    let b = system.create(ConstantColorOp::new(Color::BLACK));
    let add = system.create(AddOp);

    let first = system.connect(a, add, 0);
    assert!(first.is_valid());
    assert_eq!(
        system.try_connect(b, add, 0),
        Err(GraphError::SlotOccupied { node: add, slot: 0 })
    );
    assert_eq!(system.connect(b, add, 0), ConnectionId::INVALID);

    // The first connection is intact
    let conn = system.connection(first).unwrap();
    assert_eq!((conn.source, conn.dest, conn.slot), (a, add, 0));
    assert_eq!(system.connection_into(add, 0), Some(first));
    assert_eq!(system.connection_count(), 1);
}

#[test]
fn test_connect_validation() {
    let system = NodeSystem::default();
    let invert = system.create(InvertOp);
    let stale = system.create(InvertOp);
    system.destroy(stale);

    assert_eq!(
        system.try_connect(stale, invert, 0),
        Err(GraphError::InvalidNode(stale))
    );
    assert_eq!(
        system.try_connect(invert, stale, 0),
        Err(GraphError::InvalidNode(stale))
    );
    assert_eq!(
        system.try_connect(invert, system.output(), 1),
        Err(GraphError::SlotOutOfRange {
            node: system.output(),
            slot: 1,
            slot_count: 1
        })
    );
    // Self-connections are accepted; evaluation copes with the cycle
    assert!(system.connect(invert, invert, 0).is_valid());
}

#[test]
fn test_destroy_removes_touching_connections() {
    let system = NodeSystem::default();
    let nodes = ChainBuilder::new(&system)
        .then(ConstantColorOp::new(Color::WHITE))
        .then(InvertOp)
        .then(MirrorOp::default())
        .into_output();
    assert_eq!(system.connection_count(), 3);

    let middle = nodes[1];
    assert_eq!(system.connections_touching(middle).len(), 2);
    assert!(system.destroy(middle));
    assert!(!system.contains(middle));
    assert_eq!(system.connection_count(), 1);
    assert!(system.connections_touching(middle).is_empty());
    assert!(!system.is_slot_connected(nodes[2], 0));

    // Second destroy of the same handle is a no-op
    assert!(!system.destroy(middle));
    assert_eq!(system.process(2, 2).pixels().len(), 4);
}

#[test]
fn test_disconnect_clears_slot() {
    let system = NodeSystem::default();
    let c = system.create(ConstantColorOp::new(Color::WHITE));
    let conn = system.connect(c, system.output(), 0);
    assert!(system.is_slot_connected(system.output(), 0));

    assert!(system.disconnect(conn));
    assert!(!system.is_slot_connected(system.output(), 0));
    assert!(!system.disconnect(conn));
    assert_eq!(system.process(1, 1).get(0, 0), Color::DEFAULT);

    // The slot is free again
    assert!(system.connect(c, system.output(), 0).is_valid());
}

#[test]
fn test_node_capacity() {
    let system = system_with_capacity(4);
    let created: Vec<NodeId> = (0..3).map(|_| system.create(InvertOp)).collect();
    assert!(created.iter().all(|id| id.is_valid()));
    assert_eq!(system.create(InvertOp), NodeId::INVALID);
    assert_eq!(system.node_count(), 4);

    // Freed slots are reused
    system.destroy(created[1]);
    let again = system.create(InvertOp);
    assert!(again.is_valid());
    assert_ne!(again, created[1]);
}

#[test]
fn test_connection_table_full() {
    let system = system_with_capacity(3);
    assert_eq!(system.capacity(), (3, 6));
    let add = system.create(AddOp);
    let mix = system.create(MixOp::default());
    let output = system.output();

    // Fill every slot in the graph: 2 + 3 + 1
    for (src, dest, slot) in [
        (add, mix, 0),
        (add, mix, 1),
        (add, mix, 2),
        (mix, add, 0),
        (mix, add, 1),
        (mix, output, 0),
    ] {
        assert!(system.connect(src, dest, slot).is_valid());
    }
    assert_eq!(
        system.try_connect(add, add, 0),
        Err(GraphError::ConnectionTableFull { capacity: 6 })
    );

    let first = system.connections()[0];
    assert!(system.disconnect(first));
    assert!(system.connect(add, mix, 0).is_valid());
    assert_eq!(system.connection_count(), 6);
}

#[test]
fn test_stale_handle_does_not_reach_new_operator() {
    let system = NodeSystem::default();
    let old = system.create(ConstantColorOp::new(Color::WHITE));
    system.destroy(old);
    let new = system.create(ThresholdOp::default());

    assert_ne!(old, new);
    assert_eq!(system.kind(old), None);
    assert_eq!(system.kind(new), Some(OperatorKind::Threshold));
    assert!(!system.destroy(old));
    assert!(system.contains(new));
}

#[test]
fn test_queries() {
    let system = NodeSystem::default();
    let a = system.create(ConstantColorOp::default());
    let add = system.create(AddOp);
    let c0 = system.connect(a, add, 0);
    let c1 = system.connect(a, add, 1);
    let c2 = system.connect(add, system.output(), 0);

    assert_eq!(system.nodes().len(), 3);
    assert_eq!(system.connections(), vec![c0, c1, c2]);
    assert_eq!(system.find_connection(a, add, 1), Some(c1));
    assert_eq!(system.find_connection(add, add, 1), None);
    assert_eq!(system.connections_between(a, add), vec![c0, c1]);
    assert_eq!(system.connections_touching(add), vec![c0, c1, c2]);
    assert_eq!(system.slot_count(add), Some(2));
    assert_eq!(system.slot_name(add, 1).as_deref(), Some("B"));
    assert_eq!(system.slot_name(add, 2), None);

    let op = system.operator(add).unwrap();
    assert_eq!(op.kind(), OperatorKind::Add);
    assert!(op.as_builtin().is_some());
}

#[test]
fn test_create_default_for_every_kind() {
    let system = NodeSystem::default();
    for &kind in OperatorKind::all() {
        let id = system.create_default(kind);
        assert!(id.is_valid(), "{} rejected", kind);
        assert_eq!(system.kind(id), Some(kind));
    }
    assert_eq!(system.create_default(OperatorKind::Plugin), NodeId::INVALID);
    assert_eq!(system.process(3, 3).pixels().len(), 9);
}

#[test]
fn test_concurrent_mutation_and_process() {
    let system = Arc::new(NodeSystem::default());
    ChainBuilder::new(&system)
        .then(ImageSourceOp::from_buffer(coordinate_image(4, 4)))
        .then(MirrorOp { vertical: true })
        .into_output();

    let worker = {
        let system = system.clone();
        std::thread::spawn(move || {
            for _ in 0..50 {
                let id = system.create(InvertOp);
                let conn = system.connect(id, id, 0);
                system.disconnect(conn);
                system.destroy(id);
            }
        })
    };
    for _ in 0..20 {
        assert_eq!(system.process(8, 8).pixels().len(), 64);
    }
    worker.join().unwrap();
    assert_eq!(system.node_count(), 3);
}

#[test]
fn test_document_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");

    let system = NodeSystem::default();
    let a = system.create(ConstantColorOp::new(Color::rgb(0.2, 0.4, 0.6)));
    let b = system.create(ConstantColorOp::new(Color::rgb(0.1, 0.1, 0.1)));
    let add = system.create(AddOp);
    let threshold = system.create(ThresholdOp {
        threshold: 0.3,
        region_size: 5,
        locally_adaptive: false,
    });
    system.connect(a, add, 0);
    system.connect(b, add, 1);
    system.connect(add, threshold, 0);
    system.connect(threshold, system.output(), 0);

    GraphDocument::capture(&system).save(&path).unwrap();
    let document = GraphDocument::load(&path).unwrap();
    assert!(document.saved_at.is_some());

    let restored = NodeSystem::default();
    restored.create(InvertOp);
    let handles = document.restore(&restored).unwrap();
    assert_eq!(restored.node_count(), 5);
    assert_eq!(restored.connection_count(), 4);
    assert_eq!(restored.process(3, 3), system.process(3, 3));

    let restored_threshold = handles
        .iter()
        .copied()
        .find(|&id| restored.kind(id) == Some(OperatorKind::Threshold))
        .unwrap();
    match restored.operator(restored_threshold).unwrap().as_builtin() {
        Some(BuiltinOperator::Threshold(op)) => {
            assert_eq!(op.threshold, 0.3);
            assert_eq!(op.region_size, 5);
        }
        other => panic!("unexpected operator {:?}", other),
    }
}

#[test]
fn test_script_edit_drops_connections_into_removed_slots() {
    let system = NodeSystem::default();
    let a = system.create(ConstantColorOp::new(Color::WHITE));
    let b = system.create(ConstantColorOp::new(Color::BLACK));
    let script = system.create(
        ScriptOp::from_source(
            "fn process(x, y) { param(1) } #{ name: \"Pick\", inputs: [\"A\", \"B\"] }",
        )
        .unwrap(),
    );
    let keep = system.connect(a, script, 0);
    let dropped = system.connect(b, script, 1);
    system.connect(script, system.output(), 0);
    assert_uniform(&system.process(2, 2), Color::BLACK);

    let single = ScriptOp::from_source("fn process(x, y) { param(0) } #{ inputs: [\"A\"] }")
        .unwrap();
    system.edit(script, move |op| *op = single.into()).unwrap();

    assert_eq!(system.slot_count(script), Some(1));
    assert!(system.connection(keep).is_some());
    assert!(system.connection(dropped).is_none());
    assert!(system.is_slot_connected(script, 0));
    assert_eq!(system.connection_count(), 2);
    assert_uniform(&system.process(2, 2), Color::WHITE);
}

#[test]
fn test_script_edit_cannot_change_kind() {
    let system = NodeSystem::default();
    let script = system.create(ScriptOp::default());
    assert!(system.edit(script, |op| *op = InvertOp.into()).is_err());
    assert_eq!(system.kind(script), Some(OperatorKind::Script));
}

#[test]
fn test_document_round_trip_with_script() {
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("gray.rhai");
    let graph_path = dir.path().join("graph.json");
    std::fs::write(
        &script_path,
        "fn process(x, y) { luma(param(0)) } #{ name: \"Gray\", inputs: [\"Image\"] }",
    )
    .unwrap();

    let system = NodeSystem::default();
    ChainBuilder::new(&system)
        .then(ConstantColorOp::new(Color::rgb(0.5, 0.5, 0.5)))
        .then(ScriptOp::open(&script_path).unwrap())
        .into_output();
    GraphDocument::capture(&system).save(&graph_path).unwrap();

    let restored = NodeSystem::default();
    let handles = GraphDocument::load(&graph_path)
        .unwrap()
        .restore(&restored)
        .unwrap();
    let script = handles
        .iter()
        .copied()
        .find(|&id| restored.kind(id) == Some(OperatorKind::Script))
        .unwrap();
    assert_eq!(restored.slot_name(script, 0).as_deref(), Some("Image"));
    assert_eq!(restored.process(2, 2), system.process(2, 2));
}

#[test]
fn test_restore_with_missing_script_stays_inert() {
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("brighten.rhai");
    let graph_path = dir.path().join("graph.json");
    std::fs::write(&script_path, "fn process(x, y) { 1.0 }").unwrap();

    let system = NodeSystem::default();
    ChainBuilder::new(&system)
        .then(ScriptOp::open(&script_path).unwrap())
        .into_output();
    GraphDocument::capture(&system).save(&graph_path).unwrap();
    assert_uniform(&system.process(2, 2), Color::WHITE);
    std::fs::remove_file(&script_path).unwrap();

    let restored = NodeSystem::default();
    GraphDocument::load(&graph_path)
        .unwrap()
        .restore(&restored)
        .unwrap();
    assert_eq!(restored.node_count(), 2);
    assert_uniform(&restored.process(2, 2), Color::DEFAULT);
}

#[test]
fn test_document_rejects_future_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(&path, r#"{"version": 99, "nodes": []}"#).unwrap();
    assert!(matches!(
        GraphDocument::load(&path),
        Err(PixelGraphError::Document(_))
    ));
}
