use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::graph::io::{export_graph, import_graph, EXPORT_VERSION};
use crate::graph::model::{HandleSide, Measured};
use crate::graph::mutation::GraphEngine;

fn populated_engine() -> GraphEngine {
    let mut e = GraphEngine::new("seed");
    let id = e.fork_node("root", "q1", true, None, Some(40.0)).unwrap().node_id;
    e.complete_question(&id, "a1").unwrap();
    e.set_measured(&id, 300.0, 180.0).unwrap();
    e
}

#[test]
fn export_carries_version_and_timestamp() {
    let e = populated_engine();
    let at = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
    let payload = export_graph(e.nodes(), e.edges(), at);
    assert_eq!(payload.version, EXPORT_VERSION);
    assert_eq!(payload.exported_at, "2026-08-25T12:00:00.000Z");
    assert_eq!(payload.nodes.len(), 2);
    assert_eq!(payload.edges.len(), 1);
}

#[test]
fn export_strips_measured_sizes() {
    let e = populated_engine();
    let payload = export_graph(e.nodes(), e.edges(), Utc::now());
    assert!(payload.nodes.iter().all(|n| n.data.measured.is_none()));
    // the live engine still has them
    assert_eq!(
        e.node("root-1").unwrap().data.measured,
        Some(Measured {
            width: 300.0,
            height: 180.0
        })
    );
}

#[test]
fn exported_json_uses_wire_field_names() {
    let e = populated_engine();
    let payload = export_graph(e.nodes(), e.edges(), Utc::now());
    let json = serde_json::to_value(&payload).unwrap();
    assert!(json["exportedAt"].is_string());
    assert!(json["nodes"][0]["data"]["dynamicHandles"].is_array());
    assert!(json["edges"][0]["sourceHandle"].is_string());
}

#[test]
fn export_then_import_round_trips() {
    let e = populated_engine();
    let payload = export_graph(e.nodes(), e.edges(), Utc::now());
    let value = serde_json::to_value(&payload).unwrap();
    let imported = import_graph(value).unwrap();
    assert_eq!(imported.nodes.len(), 2);
    assert_eq!(imported.edges, e.edges().to_vec());
    // handles were intact, nothing to reconstruct
    assert!(imported.refresh.is_empty());
}

#[test]
fn import_rejects_payloads_without_both_arrays() {
    assert!(import_graph(json!({"version": 1})).is_none());
    assert!(import_graph(json!({"nodes": []})).is_none());
    assert!(import_graph(json!({"edges": []})).is_none());
    assert!(import_graph(json!("not a graph")).is_none());
    assert!(import_graph(json!({"nodes": "nope", "edges": []})).is_none());
}

#[test]
fn import_reconstructs_missing_source_handles() {
    let e = populated_engine();
    let payload = export_graph(e.nodes(), e.edges(), Utc::now());
    let mut value = serde_json::to_value(&payload).unwrap();
    // simulate an old export that lost the per-session handle list
    value["nodes"][0]["data"]
        .as_object_mut()
        .unwrap()
        .remove("dynamicHandles");

    let imported = import_graph(value).unwrap();
    assert_eq!(imported.refresh, vec!["root".to_string()]);
    let root = imported.nodes.iter().find(|n| n.id == "root").unwrap();
    assert_eq!(root.data.dynamic_handles.len(), 1);
    let handle = &root.data.dynamic_handles[0];
    assert_eq!(
        Some(handle.id.as_str()),
        imported.edges[0].source_handle.as_deref()
    );
    assert_eq!(handle.position, HandleSide::Right);
    assert_eq!(handle.style.top, Some(40.0));
}

#[test]
fn imported_graph_resumes_id_allocation() {
    let e = populated_engine();
    let payload = export_graph(e.nodes(), e.edges(), Utc::now());
    let imported = import_graph(serde_json::to_value(&payload).unwrap()).unwrap();

    let mut fresh = GraphEngine::new("other");
    fresh.load(imported.nodes, imported.edges);
    let next = fresh.fork_node("root", "q2", true, None, None).unwrap();
    assert_eq!(next.node_id, "root-2");
}
