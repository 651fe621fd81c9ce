//! Graph data model
//!
//! Serde mirror of the flow-diagram document the UI edits: nodes carrying
//! a question/answer history plus highlight annotations, edges wired to
//! dynamic connection handles. Wire-compatible with the exported JSON
//! shape, so a previously exported graph loads back without adaptation.

use serde::{Deserialize, Serialize};

use crate::highlight::ranges::{Field, HighlightScope, RawRange};

/// Id of the seed node every graph starts from.
pub const ROOT_ID: &str = "root";

/// Static target handle on branch nodes (left edge).
pub const TARGET_LEFT: &str = "target-left";
/// Static target handle on plain nodes (top edge).
pub const TARGET_TOP: &str = "target-top";

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Last measured size of a rendered node, reported by the host after
/// layout. Per-session data; stripped on export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measured {
    pub width: f64,
    pub height: f64,
}

/// Node flavor: a branch node was forked from a highlighted span and
/// carries a left-side target connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "markdown")]
    Markdown,
    #[serde(rename = "branch-markdown")]
    BranchMarkdown,
}

/// One question/answer exchange. `llm_response: None` means the answer is
/// still in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub question: String,
    #[serde(default)]
    pub llm_response: Option<String>,
}

impl QaPair {
    pub fn pending(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            llm_response: None,
        }
    }

    pub fn answered(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            llm_response: Some(answer.into()),
        }
    }
}

/// A durable annotation: `[start, end)` in the allowed-text coordinate
/// system of one specific qa pair's rendered field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: i64,
    pub end: i64,
    pub text: String,
    #[serde(default)]
    pub scope: HighlightScope,
}

/// Connection-point role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Source,
    Target,
}

/// Which node edge a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandleStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

/// An extra connection anchor created lazily, one per outgoing branch,
/// positioned to match where the user highlighted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicHandle {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: HandleKind,
    pub position: HandleSide,
    #[serde(default)]
    pub style: HandleStyle,
}

impl DynamicHandle {
    pub fn source_right(id: impl Into<String>, top: Option<f64>) -> Self {
        Self {
            id: id.into(),
            kind: HandleKind::Source,
            position: HandleSide::Right,
            style: HandleStyle { top },
        }
    }
}

/// Everything a node displays and remembers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Fallback rendered content when no per-pair renderer is available.
    #[serde(default)]
    pub label: String,
    /// Ordered question/answer history.
    #[serde(default)]
    pub context: Vec<QaPair>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Text captured from a parent node's highlighted span, rendered as a
    /// background preamble.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_handles: Vec<DynamicHandle>,
    /// In-flight indicator: the last qa pair has no answer yet.
    #[serde(default)]
    pub awaiting_answer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Measured>,
}

impl NodeData {
    /// Whether the most recent qa pair is still waiting for its answer.
    pub fn has_pending_pair(&self) -> bool {
        self.context
            .last()
            .map(|qa| qa.llm_response.is_none())
            .unwrap_or(false)
    }

    /// Highlight ranges addressed to one rendered field, shifted by that
    /// field's measured prefix so they line up with the rendered tree.
    pub fn ranges_for(&self, qa_index: i32, field: Field, prefix_len: u32) -> Vec<RawRange> {
        self.highlights
            .iter()
            .filter(|h| h.scope.qa_index == qa_index && h.scope.field == field)
            .map(|h| RawRange::new(h.start as f64, h.end as f64).shift(prefix_len as f64))
            .collect()
    }
}

/// One node of the exploration graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    #[serde(default)]
    pub selected: bool,
    pub data: NodeData,
}

impl FlowNode {
    /// The seed node every fresh graph starts with.
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            id: ROOT_ID.to_string(),
            kind: NodeKind::Markdown,
            position: Position::new(250.0, 50.0),
            selected: true,
            data: NodeData {
                label: label.into(),
                ..NodeData::default()
            },
        }
    }
}

/// Fixed edge routing mode; every edge renders as a smoothed orthogonal
/// connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeRouting {
    #[default]
    #[serde(rename = "smoothstep")]
    Smoothstep,
}

/// Directed link from a parent's connection point to a child node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(rename = "type", default)]
    pub routing: EdgeRouting,
}

/// A whole persisted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDoc {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::ranges::Field;

    #[test]
    fn node_serializes_with_wire_names() {
        let node = FlowNode {
            id: "root-1".into(),
            kind: NodeKind::BranchMarkdown,
            position: Position::new(1.0, 2.0),
            selected: true,
            data: NodeData {
                context: vec![QaPair::pending("why")],
                dynamic_handles: vec![DynamicHandle::source_right("dyn-handle-1", Some(40.0))],
                ..NodeData::default()
            },
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "branch-markdown");
        assert_eq!(json["data"]["context"][0]["llmResponse"], serde_json::Value::Null);
        assert_eq!(json["data"]["dynamicHandles"][0]["type"], "source");
        assert_eq!(json["data"]["dynamicHandles"][0]["position"], "right");
    }

    #[test]
    fn edge_round_trips_through_json() {
        let edge = FlowEdge {
            id: "root-root-1".into(),
            source: "root".into(),
            target: "root-1".into(),
            source_handle: Some("dyn-handle-1".into()),
            target_handle: Some(TARGET_LEFT.into()),
            routing: EdgeRouting::Smoothstep,
        };
        let json = serde_json::to_string(&edge).unwrap();
        assert!(json.contains("\"sourceHandle\":\"dyn-handle-1\""));
        assert!(json.contains("\"type\":\"smoothstep\""));
        let back: FlowEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edge);
    }

    #[test]
    fn highlight_scope_defaults_when_absent() {
        let h: Highlight =
            serde_json::from_str(r#"{"start":5,"end":10,"text":"hello"}"#).unwrap();
        assert_eq!(h.scope.qa_index, -1);
        assert_eq!(h.scope.field, Field::Answer);
    }

    #[test]
    fn ranges_for_filters_by_scope_and_shifts() {
        let data = NodeData {
            highlights: vec![
                Highlight {
                    start: 2,
                    end: 6,
                    text: "abcd".into(),
                    scope: HighlightScope::new(0, Field::Answer),
                },
                Highlight {
                    start: 1,
                    end: 3,
                    text: "xy".into(),
                    scope: HighlightScope::new(1, Field::Answer),
                },
            ],
            ..NodeData::default()
        };
        let ranges = data.ranges_for(0, Field::Answer, 3);
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].start, ranges[0].end), (5.0, 9.0));
        assert!(data.ranges_for(0, Field::Question, 0).is_empty());
    }
}
