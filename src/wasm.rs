//! GraphCortex: WASM boundary
//!
//! One stateful handle owning the whole session: the graph mutation
//! engine, the selection controller, the autosave scheduler, and the
//! load-generation counter. Designed for coarse cross-boundary calls —
//! the host hands over a rendered tree or a selection snapshot once and
//! gets a complete outcome back, instead of chatting per node.
//!
//! The host keeps the side effects: it performs the `/ask` fetch with the
//! request this module builds, persists the payload `pollSave` yields,
//! and feeds clock readings and answers back in.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::graph::io::{export_graph, import_graph};
use crate::graph::model::{FlowEdge, FlowNode};
use crate::graph::mutation::GraphEngine;
use crate::highlight::injector::inject_ranges;
use crate::highlight::offsets::compute_offsets;
use crate::highlight::ranges::Field;
use crate::highlight::tree::{MdNode, SelectionRange};
use crate::highlight::walk::allowed_text;
use crate::selection::{
    ControllerState, RemovalPlan, SelectionController, SelectionSnapshot, ToolboxPlacement,
};
use crate::session::{
    answer_from_failure, composed_question, AskRequest, LoadGeneration, SaveScheduler,
};

// =============================================================================
// Wire types
// =============================================================================

/// Parameters of a branch fork, as one object from the host.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForkInput {
    parent_id: String,
    question: String,
    #[serde(default)]
    as_branch: bool,
    #[serde(default)]
    reference_context: Option<String>,
    /// Which qa pair of the parent the reference came from.
    #[serde(default)]
    qa_index: Option<i32>,
    /// Node-local anchor height for the new connection handle.
    #[serde(default)]
    anchor_top: Option<f64>,
    #[serde(default)]
    model: Option<String>,
}

/// What a submission hands back: the node now awaiting its answer and the
/// request the host must POST.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReply {
    node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    handle_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    refresh: Vec<String>,
    request: AskRequest,
}

/// The committed highlight record a confirm hands back.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmReply {
    pub node_id: String,
    pub context_text: String,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePayload<'a> {
    title: String,
    nodes: &'a [FlowNode],
    edges: &'a [FlowEdge],
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    match serde_wasm_bindgen::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            crate::log::warn(&format!("[wasm] serialize failed: {e}"));
            JsValue::NULL
        }
    }
}

fn parse_field(field: &str) -> Field {
    if field.eq_ignore_ascii_case("question") {
        Field::Question
    } else {
        Field::Answer
    }
}

fn now_utc() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(js_sys::Date::now() as i64)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

// =============================================================================
// GraphCortex
// =============================================================================

/// One exploration-graph session.
#[wasm_bindgen]
pub struct GraphCortex {
    engine: GraphEngine,
    controller: SelectionController,
    scheduler: SaveScheduler,
    loads: LoadGeneration,
    graph_id: i64,
}

/// Synchronous core of the session methods; the `js_*` bindings below
/// only add the serde boundary.
impl GraphCortex {
    /// Commit the visible selection as a highlight. The target node is
    /// validated before any stored highlight is touched, so a stale
    /// snapshot changes nothing. A highlight committed since the last
    /// submission is superseded (removed) by the new one.
    pub fn confirm_selection(&mut self) -> Option<ConfirmReply> {
        let outcome = self.controller.confirm()?;
        if self.engine.node(&outcome.node_id).is_none() {
            crate::log::warn(&format!(
                "[wasm] confirm dropped: unknown node '{}'",
                outcome.node_id
            ));
            return None;
        }
        if let Some(prev) = &outcome.remove {
            self.engine
                .remove_highlight_exact_scoped(&prev.node_id, prev.start, prev.end, prev.scope);
        }
        let reply = ConfirmReply {
            node_id: outcome.node_id.clone(),
            context_text: outcome.context_text.clone(),
            start: outcome.highlight.start,
            end: outcome.highlight.end,
        };
        if let Err(e) = self.engine.add_highlight(&outcome.node_id, outcome.highlight) {
            crate::log::warn(&format!("[wasm] confirm dropped: {e}"));
            return None;
        }
        Some(reply)
    }

    /// Synchronous half of a follow-up submission: append the pending
    /// pair and finalize the committed highlight — a submit makes it
    /// permanent, on the follow-up path just as on a fork.
    pub fn ask_question(&mut self, node_id: &str, question: &str) -> Result<AskRequest, String> {
        self.engine.begin_question(node_id, question)?;
        self.controller.note_submitted();
        Ok(AskRequest::new(self.graph_id, node_id, question))
    }
}

#[wasm_bindgen]
impl GraphCortex {
    /// Fresh graph carrying only the selected root node.
    #[wasm_bindgen(constructor)]
    pub fn new(graph_id: f64, root_label: &str) -> Self {
        Self {
            engine: GraphEngine::new(root_label),
            controller: SelectionController::new(),
            scheduler: SaveScheduler::new(),
            loads: LoadGeneration::new(),
            graph_id: graph_id as i64,
        }
    }

    // ---- graph state ----

    #[wasm_bindgen(getter)]
    pub fn nodes(&self) -> JsValue {
        to_js(&self.engine.nodes())
    }

    #[wasm_bindgen(getter)]
    pub fn edges(&self) -> JsValue {
        to_js(&self.engine.edges())
    }

    #[wasm_bindgen(getter)]
    pub fn title(&self) -> String {
        self.engine.title()
    }

    /// Replace the graph wholesale (e.g. switching to another saved
    /// graph).
    #[wasm_bindgen(js_name = loadGraph)]
    pub fn js_load_graph(&mut self, nodes: JsValue, edges: JsValue) -> Result<(), JsValue> {
        let nodes: Vec<FlowNode> = serde_wasm_bindgen::from_value(nodes)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse nodes: {e}")))?;
        let edges: Vec<FlowEdge> = serde_wasm_bindgen::from_value(edges)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse edges: {e}")))?;
        self.engine.load(nodes, edges);
        self.scheduler.cancel();
        Ok(())
    }

    /// Snapshot for download. Transient measurements are stripped.
    #[wasm_bindgen(js_name = exportGraph)]
    pub fn js_export_graph(&self) -> JsValue {
        to_js(&export_graph(
            self.engine.nodes(),
            self.engine.edges(),
            now_utc(),
        ))
    }

    /// Load a previously exported payload. Returns the ids of nodes that
    /// gained a reconstructed handle (re-measure them), or `null` when
    /// the payload is not a graph — in which case nothing changed.
    #[wasm_bindgen(js_name = importGraph)]
    pub fn js_import_graph(&mut self, payload: JsValue) -> JsValue {
        let Ok(value) = serde_wasm_bindgen::from_value::<serde_json::Value>(payload) else {
            return JsValue::NULL;
        };
        let Some(imported) = import_graph(value) else {
            return JsValue::NULL;
        };
        self.engine.load(imported.nodes, imported.edges);
        self.scheduler.cancel();
        to_js(&imported.refresh)
    }

    // ---- highlight rendering ----

    /// Map a host selection (tree-local endpoints) to allowed-text
    /// offsets for one rendered field. Returns `{start, end}` or `null`
    /// when the selection does not resolve.
    #[wasm_bindgen(js_name = computeOffsets)]
    pub fn js_compute_offsets(&self, tree: JsValue, range: JsValue, field: &str) -> JsValue {
        let Ok(tree) = serde_wasm_bindgen::from_value::<MdNode>(tree) else {
            return JsValue::NULL;
        };
        let Ok(range) = serde_wasm_bindgen::from_value::<SelectionRange>(range) else {
            return JsValue::NULL;
        };
        let prefix = self.engine.format().prefix_len(parse_field(field));
        match compute_offsets(&tree, &range, prefix) {
            Some(span) => to_js(&span),
            None => JsValue::NULL,
        }
    }

    /// Wrap a node's stored highlights for one rendered block into the
    /// given tree and return the decorated tree.
    #[wasm_bindgen(js_name = decorateTree)]
    pub fn js_decorate_tree(
        &self,
        tree: JsValue,
        node_id: &str,
        qa_index: i32,
        field: &str,
    ) -> JsValue {
        let Ok(mut tree) = serde_wasm_bindgen::from_value::<MdNode>(tree) else {
            return JsValue::NULL;
        };
        let Some(node) = self.engine.node(node_id) else {
            return to_js(&tree);
        };
        let field = parse_field(field);
        let prefix = self.engine.format().prefix_len(field);
        let ranges = node.data.ranges_for(qa_index, field, prefix);
        inject_ranges(&mut tree, &ranges);
        to_js(&tree)
    }

    // ---- selection lifecycle ----

    /// Pointer released; `selection` is the resolved snapshot or
    /// `null`/`undefined`. Returns whether the toolbox is now visible.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn js_pointer_up(&mut self, selection: JsValue) -> bool {
        let snapshot = if selection.is_null() || selection.is_undefined() {
            None
        } else {
            serde_wasm_bindgen::from_value::<SelectionSnapshot>(selection).ok()
        };
        matches!(
            self.controller.pointer_up(snapshot),
            ControllerState::ToolboxVisible(_)
        )
    }

    /// Toolbox coordinates for the current selection, or `null` when
    /// hidden. `node_left`/`node_top` are the owning node's viewport
    /// origin.
    #[wasm_bindgen(js_name = toolboxPlacement)]
    pub fn js_toolbox_placement(&self, node_left: f64, node_top: f64, zoom: f64) -> JsValue {
        match self.controller.state() {
            ControllerState::ToolboxVisible(snap) => {
                to_js(&ToolboxPlacement::compute(&snap.rect, node_left, node_top, zoom))
            }
            ControllerState::Idle => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = cancelSelection)]
    pub fn js_cancel_selection(&mut self) {
        self.controller.cancel();
    }

    /// Commit the visible selection as a highlight. A highlight committed
    /// since the last submission is removed first. Returns the committed
    /// record (node, span, context text) or `null` when no toolbox was
    /// open.
    #[wasm_bindgen(js_name = confirmSelection)]
    pub fn js_confirm_selection(&mut self) -> JsValue {
        match self.confirm_selection() {
            Some(reply) => to_js(&reply),
            None => JsValue::NULL,
        }
    }

    /// A child's background preamble was closed; remove the parent
    /// highlight it quotes. `tree` is the parent block's rendered tree,
    /// used for text matching when the exact record is gone.
    #[wasm_bindgen(js_name = closeContext)]
    pub fn js_close_context(&mut self, node_id: &str, closed_text: &str, tree: JsValue) {
        match self.controller.close_context(closed_text, Some(node_id)) {
            Some(RemovalPlan::Exact(rec)) => {
                self.engine
                    .remove_highlight_exact_scoped(&rec.node_id, rec.start, rec.end, rec.scope);
            }
            Some(RemovalPlan::ByText { node_id, text }) => {
                let allowed = serde_wasm_bindgen::from_value::<MdNode>(tree)
                    .map(|t| allowed_text(&t))
                    .unwrap_or_default();
                self.engine.remove_highlight_by_text(&node_id, &allowed, &text);
            }
            None => {}
        }
    }

    // ---- questions ----

    /// Fork a branch node for a question about a highlighted span.
    /// Returns the new node, the parent ids to re-measure, and the ready
    /// `/ask` request body.
    #[wasm_bindgen(js_name = forkQuestion)]
    pub fn js_fork_question(&mut self, params: JsValue) -> Result<JsValue, JsValue> {
        let input: ForkInput = serde_wasm_bindgen::from_value(params)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse fork params: {e}")))?;
        let outcome = self
            .engine
            .fork_node(
                &input.parent_id,
                &input.question,
                input.as_branch,
                input.reference_context.as_deref(),
                input.anchor_top,
            )
            .map_err(|e| JsValue::from_str(&e))?;
        self.controller.note_submitted();

        let question = match input.reference_context.as_deref() {
            Some(ctx) if !ctx.is_empty() => composed_question(ctx, &input.question),
            _ => input.question.clone(),
        };
        let mut request = AskRequest::new(self.graph_id, &outcome.node_id, question);
        if let Some(qa_index) = input.qa_index {
            request = request.with_context(self.graph_id, &input.parent_id, qa_index);
        }
        if let Some(model) = input.model {
            request = request.with_model(model);
        }
        Ok(to_js(&SubmitReply {
            node_id: outcome.node_id,
            handle_id: Some(outcome.handle_id),
            refresh: outcome.refresh,
            request,
        }))
    }

    /// Ask a follow-up on an existing node (appends a pending qa pair).
    #[wasm_bindgen(js_name = askQuestion)]
    pub fn js_ask_question(&mut self, node_id: &str, question: &str) -> Result<JsValue, JsValue> {
        let request = self
            .ask_question(node_id, question)
            .map_err(|e| JsValue::from_str(&e))?;
        Ok(to_js(&SubmitReply {
            node_id: node_id.to_string(),
            handle_id: None,
            refresh: Vec::new(),
            request,
        }))
    }

    /// Resolve a node's pending question with the backend's answer.
    #[wasm_bindgen(js_name = applyAnswer)]
    pub fn js_apply_answer(&mut self, node_id: &str, answer: &str) -> Result<(), JsValue> {
        self.engine
            .complete_question(node_id, answer)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Resolve a pending question with a request failure; the node leaves
    /// the in-flight state and shows the failure text.
    #[wasm_bindgen(js_name = applyFailure)]
    pub fn js_apply_failure(&mut self, node_id: &str, error: &str) -> Result<(), JsValue> {
        self.engine
            .complete_question(node_id, &answer_from_failure(error))
            .map_err(|e| JsValue::from_str(&e))
    }

    // ---- layout feedback ----

    #[wasm_bindgen(js_name = selectOnly)]
    pub fn js_select_only(&mut self, node_id: &str) {
        self.engine.select_only(node_id);
    }

    #[wasm_bindgen(js_name = setMeasured)]
    pub fn js_set_measured(
        &mut self,
        node_id: &str,
        width: f64,
        height: f64,
    ) -> Result<(), JsValue> {
        self.engine
            .set_measured(node_id, width, height)
            .map_err(|e| JsValue::from_str(&e))
    }

    // ---- persistence ----

    /// Something save-worthy changed; (re)arm the autosave debounce.
    #[wasm_bindgen(js_name = noteMutation)]
    pub fn js_note_mutation(&mut self) {
        self.scheduler.schedule(js_sys::Date::now());
    }

    /// Poll the autosave. Returns `{title, nodes, edges}` once per armed
    /// debounce, and only when the latest answer has arrived; `null`
    /// otherwise.
    #[wasm_bindgen(js_name = pollSave)]
    pub fn js_poll_save(&mut self) -> JsValue {
        if !self.engine.should_persist() {
            return JsValue::NULL;
        }
        if !self.scheduler.take_due(js_sys::Date::now()) {
            return JsValue::NULL;
        }
        to_js(&SavePayload {
            title: self.engine.title(),
            nodes: self.engine.nodes(),
            edges: self.engine.edges(),
        })
    }

    // ---- load generations ----

    /// Start a graph load; the returned token must accompany the result.
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn js_begin_load(&mut self) -> f64 {
        self.loads.begin() as f64
    }

    /// Whether a load result is still the most recent one requested.
    #[wasm_bindgen(js_name = isCurrentLoad)]
    pub fn js_is_current_load(&self, token: f64) -> bool {
        self.loads.is_current(token as u64)
    }
}
