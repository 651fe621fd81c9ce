//! Graph mutation engine
//!
//! Owns the node/edge collections and performs every structural edit:
//! forking a branch node off a parent (with its dynamic connection
//! handle), committing pending questions and their answers, selection,
//! and highlight bookkeeping. All mutation happens through these methods;
//! the host only ever observes whole collections.

use serde::Serialize;

use super::label::LabelFormat;
use super::model::{
    DynamicHandle, EdgeRouting, FlowEdge, FlowNode, Highlight, Measured, NodeData, NodeKind,
    Position, QaPair, ROOT_ID, TARGET_LEFT, TARGET_TOP,
};
use super::registry::ChildRegistry;
use crate::highlight::ranges::HighlightScope;
use crate::highlight::walk::slice_utf16;

/// First branch off a node: up and to the right of the parent.
const FIRST_CHILD_DX: f64 = 320.0;
const FIRST_CHILD_DY: f64 = -150.0;
/// Later branches: stacked under the previous sibling.
const SIBLING_DX: f64 = 25.0;
const SIBLING_GAP: f64 = 10.0;

/// What a fork produced. `refresh` lists nodes whose connection points
/// changed; the host must re-measure them *before* any layout read that
/// depends on the new handle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkOutcome {
    pub node_id: String,
    pub handle_id: String,
    pub refresh: Vec<String>,
}

pub struct GraphEngine {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    registry: ChildRegistry,
    format: LabelFormat,
    handle_seq: u64,
}

impl GraphEngine {
    /// Fresh graph: a single selected root node carrying the given label.
    pub fn new(root_label: &str) -> Self {
        let root = FlowNode::root(root_label);
        let mut registry = ChildRegistry::new();
        registry.seed([root.id.as_str()]);
        Self {
            nodes: vec![root],
            edges: Vec::new(),
            registry,
            format: LabelFormat::default(),
            handle_seq: 0,
        }
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn format(&self) -> &LabelFormat {
        &self.format
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, String> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| format!("unknown node '{id}'"))
    }

    /// Replace both collections wholesale (graph load) and re-seed the
    /// child registry from the loaded ids.
    pub fn load(&mut self, nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) {
        self.registry
            .seed(nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>());
        self.nodes = nodes;
        self.edges = edges;
    }

    /// Fork a child node off `parent_id` for a new question.
    ///
    /// Registers the dynamic source handle on the parent first — the host
    /// is told via `refresh` to re-measure the parent before any layout
    /// read that depends on the new connection point — then allocates the
    /// child id, places the child (first child up-right of the parent,
    /// later children stacked under the previous sibling), and wires
    /// exactly one edge through the fresh handle.
    pub fn fork_node(
        &mut self,
        parent_id: &str,
        question: &str,
        as_branch: bool,
        reference_context: Option<&str>,
        anchor_top: Option<f64>,
    ) -> Result<ForkOutcome, String> {
        let parent_idx = self.index_of(parent_id)?;

        self.handle_seq += 1;
        let handle_id = format!("dyn-handle-{}", self.handle_seq);
        self.nodes[parent_idx]
            .data
            .dynamic_handles
            .push(DynamicHandle::source_right(&handle_id, anchor_top));

        let last_sibling = self.registry.last_child(parent_id);
        let new_id = self.registry.allocate(parent_id);

        let parent_pos = self.nodes[parent_idx].position;
        let position = match last_sibling.as_deref().and_then(|id| self.node(id)) {
            Some(last) => Position::new(
                last.position.x + SIBLING_DX,
                last.position.y + last.data.measured.map(|m| m.height).unwrap_or(0.0) + SIBLING_GAP,
            ),
            None => Position::new(parent_pos.x + FIRST_CHILD_DX, parent_pos.y + FIRST_CHILD_DY),
        };

        let label = self
            .format
            .build_label(None, question, None, reference_context);
        let new_node = FlowNode {
            id: new_id.clone(),
            kind: if as_branch {
                NodeKind::BranchMarkdown
            } else {
                NodeKind::Markdown
            },
            position,
            selected: true,
            data: NodeData {
                label,
                context: vec![QaPair::pending(question)],
                reference_context: reference_context.map(str::to_string),
                awaiting_answer: true,
                ..NodeData::default()
            },
        };

        // single-selection invariant over the whole node set
        for node in &mut self.nodes {
            node.selected = false;
        }
        self.nodes.push(new_node);

        self.edges.push(FlowEdge {
            id: format!("{parent_id}-{new_id}"),
            source: parent_id.to_string(),
            target: new_id.clone(),
            source_handle: Some(handle_id.clone()),
            target_handle: Some(if as_branch { TARGET_LEFT } else { TARGET_TOP }.to_string()),
            routing: EdgeRouting::Smoothstep,
        });

        Ok(ForkOutcome {
            node_id: new_id,
            handle_id,
            refresh: vec![parent_id.to_string()],
        })
    }

    /// Append a pending qa pair — the synchronous half of a submission,
    /// so the UI shows an in-flight indicator before the network call.
    pub fn begin_question(&mut self, node_id: &str, question: &str) -> Result<(), String> {
        let idx = self.index_of(node_id)?;
        let label = self
            .format
            .build_label(Some(&self.nodes[idx].data), question, None, None);
        let data = &mut self.nodes[idx].data;
        data.context.push(QaPair::pending(question));
        data.awaiting_answer = true;
        data.label = label;
        Ok(())
    }

    /// Resolve the pending pair with its answer (or the failure text —
    /// the node must always leave the pending state).
    pub fn complete_question(&mut self, node_id: &str, answer: &str) -> Result<(), String> {
        let idx = self.index_of(node_id)?;
        let question = match self.nodes[idx].data.context.last() {
            Some(last) if last.llm_response.is_none() => last.question.clone(),
            _ => return Err(format!("node '{node_id}' has no pending question")),
        };
        let label =
            self.format
                .build_label(Some(&self.nodes[idx].data), &question, Some(answer), None);
        let data = &mut self.nodes[idx].data;
        if let Some(last) = data.context.last_mut() {
            last.llm_response = Some(answer.to_string());
        }
        data.awaiting_answer = false;
        data.label = label;
        Ok(())
    }

    /// Select one node, deselect every other.
    pub fn select_only(&mut self, id: &str) {
        for node in &mut self.nodes {
            node.selected = node.id == id;
        }
    }

    pub fn set_measured(&mut self, node_id: &str, width: f64, height: f64) -> Result<(), String> {
        let idx = self.index_of(node_id)?;
        self.nodes[idx].data.measured = Some(Measured { width, height });
        Ok(())
    }

    pub fn add_highlight(&mut self, node_id: &str, highlight: Highlight) -> Result<(), String> {
        let idx = self.index_of(node_id)?;
        self.nodes[idx].data.highlights.push(highlight);
        Ok(())
    }

    /// Remove by exact `[start, end)` match, any scope.
    pub fn remove_highlight_exact(&mut self, node_id: &str, start: i64, end: i64) {
        if let Ok(idx) = self.index_of(node_id) {
            self.nodes[idx]
                .data
                .highlights
                .retain(|h| !(h.start == start && h.end == end));
        }
    }

    /// Remove by exact `[start, end)` and scope match.
    pub fn remove_highlight_exact_scoped(
        &mut self,
        node_id: &str,
        start: i64,
        end: i64,
        scope: HighlightScope,
    ) {
        if let Ok(idx) = self.index_of(node_id) {
            self.nodes[idx]
                .data
                .highlights
                .retain(|h| !(h.start == start && h.end == end && h.scope == scope));
        }
    }

    /// Fallback removal: drop every highlight whose slice of the node's
    /// rendered allowed text equals `text` verbatim. May remove the wrong
    /// record when two identical substrings exist — accepted
    /// approximation, only used when the exact record is gone.
    pub fn remove_highlight_by_text(&mut self, node_id: &str, allowed: &str, text: &str) {
        if let Ok(idx) = self.index_of(node_id) {
            self.nodes[idx].data.highlights.retain(|h| {
                let start = h.start.max(0) as u32;
                let end = h.end.max(0) as u32;
                slice_utf16(allowed, start, end) != text
            });
        }
    }

    /// Graph title for persistence: the first question ever asked.
    pub fn title(&self) -> String {
        self.node(ROOT_ID)
            .and_then(|root| root.data.context.first())
            .map(|qa| qa.question.clone())
            .unwrap_or_default()
    }

    /// A save is worthwhile only once the most recent qa pair has its
    /// answer — never persist a graph mid-flight.
    pub fn should_persist(&self) -> bool {
        self.nodes
            .last()
            .and_then(|n| n.data.context.last())
            .map(|qa| qa.llm_response.is_some())
            .unwrap_or(false)
    }
}
