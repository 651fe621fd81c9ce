//! Graph export / import
//!
//! Export produces a versioned JSON document with transient per-session
//! state stripped. Import is defensive: a payload without proper node and
//! edge arrays is a no-op (never partially applied), and edges whose
//! `sourceHandle` no longer exists on their source node get the handle
//! reconstructed with default placement — dynamic handles are per-session
//! metadata and old exports may have lost them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::model::{DynamicHandle, FlowEdge, FlowNode};
use crate::log;

pub const EXPORT_VERSION: u32 = 1;

/// Vertical anchor given to a reconstructed source handle.
pub const DEFAULT_HANDLE_TOP: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub version: u32,
    pub exported_at: String,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Loose mirror of the export shape; both arrays must be present for the
/// import to proceed.
#[derive(Deserialize)]
struct RawImport {
    nodes: Option<Vec<FlowNode>>,
    edges: Option<Vec<FlowEdge>>,
}

pub struct ImportResult {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    /// Nodes that gained a reconstructed handle; the host must re-measure
    /// them before the edges attach.
    pub refresh: Vec<String>,
}

/// Serialize the current graph for download. Measured sizes are
/// per-session data and are stripped.
pub fn export_graph(nodes: &[FlowNode], edges: &[FlowEdge], at: DateTime<Utc>) -> ExportPayload {
    let nodes = nodes
        .iter()
        .cloned()
        .map(|mut n| {
            n.data.measured = None;
            n
        })
        .collect();
    ExportPayload {
        version: EXPORT_VERSION,
        exported_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        nodes,
        edges: edges.to_vec(),
    }
}

/// Parse an exported payload. Returns `None` (no-op) when the payload is
/// not shaped like a graph — a bad paste must never corrupt a working
/// one.
pub fn import_graph(payload: serde_json::Value) -> Option<ImportResult> {
    let raw: RawImport = serde_json::from_value(payload).ok()?;
    let (mut nodes, edges) = (raw.nodes?, raw.edges?);
    let refresh = reconcile_handles(&mut nodes, &edges);
    Some(ImportResult {
        nodes,
        edges,
        refresh,
    })
}

/// Rebuild any dynamic source handle an edge references but its source
/// node no longer carries.
pub fn reconcile_handles(nodes: &mut [FlowNode], edges: &[FlowEdge]) -> Vec<String> {
    let mut refresh: Vec<String> = Vec::new();
    for node in nodes.iter_mut() {
        for edge in edges.iter().filter(|e| e.source == node.id) {
            let Some(handle_id) = edge.source_handle.as_deref() else {
                continue;
            };
            if node.data.dynamic_handles.iter().any(|h| h.id == handle_id) {
                continue;
            }
            log::warn(&format!(
                "[import] reconstructed missing source handle '{handle_id}' on node '{}'",
                node.id
            ));
            node.data
                .dynamic_handles
                .push(DynamicHandle::source_right(handle_id, Some(DEFAULT_HANDLE_TOP)));
            if !refresh.contains(&node.id) {
                refresh.push(node.id.clone());
            }
        }
    }
    refresh
}
