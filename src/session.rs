//! Ask-session plumbing
//!
//! Wire types for the question endpoint, the debounced autosave
//! scheduler, and load-generation tokens that keep a slow graph load from
//! clobbering a newer one. The core stays synchronous; the host performs
//! the actual network and storage calls and feeds results (and clock
//! readings) back in.

use serde::{Deserialize, Serialize};

/// Model used when the host does not pick one.
pub const DEFAULT_MODEL: &str = "THUDM/glm-4-9b-chat";

/// Quiet period after the last mutation before a save fires.
pub const SAVE_DEBOUNCE_MS: f64 = 800.0;

/// Body of `POST /ask`. Threads are addressed as `<graphId>-<nodeId>` so
/// the backend keeps one conversation per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_msg_index: Option<i32>,
    pub model: String,
}

impl AskRequest {
    pub fn new(graph_id: i64, node_id: &str, question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            thread_id: thread_id(graph_id, node_id),
            context_thread_id: None,
            context_msg_index: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Point the backend at the parent conversation the highlighted
    /// answer came from.
    pub fn with_context(mut self, graph_id: i64, parent_node_id: &str, qa_index: i32) -> Self {
        self.context_thread_id = Some(thread_id(graph_id, parent_node_id));
        self.context_msg_index = Some(qa_index);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

pub fn thread_id(graph_id: i64, node_id: &str) -> String {
    format!("{graph_id}-{node_id}")
}

/// Question text sent for a branch fork: the highlighted span prefixed
/// onto the user's question so the model sees what is being asked about.
pub fn composed_question(reference_context: &str, question: &str) -> String {
    format!("{reference_context}: {question}\n\n")
}

/// Reference context recorded on a branch node: the highlighted span,
/// attributed to the parent question it was selected under.
pub fn reference_sentence(parent_question: Option<&str>, highlight: &str) -> String {
    match parent_question.filter(|q| !q.is_empty()) {
        Some(q) => format!("{q}: {highlight}"),
        None => highlight.to_string(),
    }
}

/// Reply of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AskResponse {
    /// The text to store as the node's answer. A failed request still
    /// resolves the pending pair, with the failure spelled out.
    pub fn into_answer(self) -> String {
        match (self.answer, self.error) {
            (Some(answer), _) if !answer.is_empty() => answer,
            (_, Some(error)) => answer_from_failure(&error),
            _ => answer_from_failure("empty response"),
        }
    }
}

pub fn answer_from_failure(err: &str) -> String {
    format!("Request failed: {err}")
}

// ============================================================
// Autosave debounce
// ============================================================

/// Latest-wins save debounce over host-supplied clock readings (ms).
/// Every mutation pushes the deadline out; the host polls `take_due`.
#[derive(Debug, Default)]
pub struct SaveScheduler {
    deadline: Option<f64>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mutation happened at `now_ms`; (re)arm the deadline.
    pub fn schedule(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + SAVE_DEBOUNCE_MS);
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the quiet period has elapsed. Consumes the deadline when it
    /// fires, so each arm yields exactly one save.
    pub fn take_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(at) if now_ms >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Monotonic token for graph loads: results from a superseded load are
/// dropped instead of overwriting the newer graph.
#[derive(Debug, Default)]
pub struct LoadGeneration {
    current: u64,
}

impl LoadGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.current
    }
}
