//! Selection controller
//!
//! State machine behind the floating selection toolbox:
//!
//! - pointer-up with a resolvable, non-empty selection shows the toolbox
//!   anchored just above the selection rectangle;
//! - pointer-up anywhere else (or an unresolvable selection) hides it;
//! - confirming commits the selection as a highlight and supersedes the
//!   previously committed one — until a question is actually submitted,
//!   at most one "context" highlight is live at a time;
//! - closing a child's background preamble yields a removal plan for the
//!   parent highlight it came from: exact coordinates when the committed
//!   record is still known, text matching as the fallback.
//!
//! The controller never touches the graph itself; it returns outcomes the
//! caller applies through the mutation engine.

use serde::{Deserialize, Serialize};

use crate::graph::model::Highlight;
use crate::highlight::ranges::{HighlightScope, Span};

/// Vertical gap between the selection rectangle and the toolbox.
pub const TOOLBOX_LIFT: f64 = 40.0;

/// Viewport-space bounding rectangle of the selection, as reported by the
/// host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// One resolved selection: which node, which rendered block, the exact
/// text, its span in allowed-text coordinates, and where it sits on
/// screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    pub node_id: String,
    pub text: String,
    pub span: Span,
    pub scope: HighlightScope,
    pub rect: Rect,
}

/// Where to place the toolbox, in both coordinate systems the host needs:
/// raw viewport coordinates and node-local canvas coordinates (for the
/// dynamic handle anchored at the same height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxPlacement {
    pub viewport_x: f64,
    pub viewport_y: f64,
    pub anchor_top: f64,
}

impl ToolboxPlacement {
    /// `node_left`/`node_top` are the node's viewport-space origin and
    /// `zoom` the current canvas zoom; the handle anchor must be in the
    /// node's own (unzoomed) coordinate space.
    pub fn compute(rect: &Rect, node_left: f64, node_top: f64, zoom: f64) -> Self {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        Self {
            viewport_x: rect.right,
            viewport_y: rect.top - TOOLBOX_LIFT,
            anchor_top: (rect.top - node_top) / zoom,
        }
    }
}

/// The highlight record produced by the last confirm, kept until the
/// question it backs is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedHighlight {
    pub node_id: String,
    pub start: i64,
    pub end: i64,
    pub scope: HighlightScope,
    pub text: String,
}

/// What a confirm asks the caller to do: maybe remove the superseded
/// highlight, then add the new one.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub remove: Option<CommittedHighlight>,
    pub node_id: String,
    pub highlight: Highlight,
    /// The selected text, to be offered as reference context for the next
    /// question.
    pub context_text: String,
}

/// How to remove the parent highlight behind a closed context preamble.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalPlan {
    /// The committed record is still known; remove by coordinates.
    Exact(CommittedHighlight),
    /// Record lost (e.g. after a reload); remove whichever highlight's
    /// slice of the node's allowed text matches.
    ByText { node_id: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    ToolboxVisible(SelectionSnapshot),
}

#[derive(Default)]
pub struct SelectionController {
    state: ControllerState,
    last_committed: Option<CommittedHighlight>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn toolbox_visible(&self) -> bool {
        matches!(self.state, ControllerState::ToolboxVisible(_))
    }

    /// Pointer released. A usable selection shows the toolbox; anything
    /// else (no selection, whitespace-only text, collapsed span) hides it.
    pub fn pointer_up(&mut self, selection: Option<SelectionSnapshot>) -> &ControllerState {
        self.state = match selection {
            Some(snap) if !snap.text.trim().is_empty() && snap.span.end > snap.span.start => {
                ControllerState::ToolboxVisible(snap)
            }
            _ => ControllerState::Idle,
        };
        &self.state
    }

    /// Dismiss without committing.
    pub fn cancel(&mut self) {
        self.state = ControllerState::Idle;
    }

    /// Commit the visible selection as a highlight. The previously
    /// committed highlight (if its question was never submitted) is
    /// returned for removal — a fresh selection supersedes it.
    pub fn confirm(&mut self) -> Option<CommitOutcome> {
        let snap = match std::mem::take(&mut self.state) {
            ControllerState::ToolboxVisible(snap) => snap,
            ControllerState::Idle => return None,
        };
        let committed = CommittedHighlight {
            node_id: snap.node_id.clone(),
            start: snap.span.start,
            end: snap.span.end,
            scope: snap.scope,
            text: snap.text.clone(),
        };
        let remove = self.last_committed.replace(committed);
        Some(CommitOutcome {
            remove,
            node_id: snap.node_id,
            highlight: Highlight {
                start: snap.span.start,
                end: snap.span.end,
                text: snap.text.clone(),
                scope: snap.scope,
            },
            context_text: snap.text,
        })
    }

    /// The question backed by the committed highlight was submitted; the
    /// highlight is now permanent and no longer subject to supersession.
    pub fn note_submitted(&mut self) {
        self.last_committed = None;
    }

    /// A child node's background preamble was closed; plan the removal of
    /// the parent highlight it quotes. `fallback_node` is the parent to
    /// search by text when the committed record does not match. Every
    /// close retires the committed record — the highlight it described is
    /// being removed either way, so a later confirm must not act on it.
    pub fn close_context(
        &mut self,
        closed_text: &str,
        fallback_node: Option<&str>,
    ) -> Option<RemovalPlan> {
        match self.last_committed.take() {
            Some(rec) if rec.text == closed_text => Some(RemovalPlan::Exact(rec)),
            _ => fallback_node.map(|id| RemovalPlan::ByText {
                node_id: id.to_string(),
                text: closed_text.to_string(),
            }),
        }
    }
}
