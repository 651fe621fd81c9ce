//! Rendered Markdown tree model
//!
//! Serde mirror of the hast-shaped tree the UI produces when it renders a
//! node's Markdown (headings, paragraphs, KaTeX output, code blocks). The
//! UI serializes the tree across the WASM boundary, the core transforms it
//! (highlight injection) and hands it back. Only the pieces the highlight
//! subsystem cares about are modeled: element tag, class list, children,
//! and text values.

use serde::{Deserialize, Serialize};

/// One node of the rendered Markdown tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MdNode {
    Element {
        #[serde(rename = "tagName")]
        tag: String,
        #[serde(rename = "className", default, skip_serializing_if = "Vec::is_empty")]
        classes: Vec<String>,
        #[serde(default)]
        children: Vec<MdNode>,
    },
    Text {
        value: String,
    },
}

impl MdNode {
    pub fn element(tag: impl Into<String>, children: Vec<MdNode>) -> Self {
        MdNode::Element {
            tag: tag.into(),
            classes: Vec::new(),
            children,
        }
    }

    pub fn element_with_class(
        tag: impl Into<String>,
        class: impl Into<String>,
        children: Vec<MdNode>,
    ) -> Self {
        MdNode::Element {
            tag: tag.into(),
            classes: vec![class.into()],
            children,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        MdNode::Text {
            value: value.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MdNode::Text { .. })
    }

    /// Children slice; empty for text nodes.
    pub fn children(&self) -> &[MdNode] {
        match self {
            MdNode::Element { children, .. } => children,
            MdNode::Text { .. } => &[],
        }
    }
}

/// One endpoint of a DOM selection, re-addressed for the core.
///
/// `text_index` identifies the text node by its document-order index over
/// *all* text nodes under the content root (the same order a DOM
/// TreeWalker yields them), `offset` is the UTF-16 offset within that
/// node, matching `Range.startOffset`/`endOffset` semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreePoint {
    pub text_index: usize,
    pub offset: u32,
}

/// A non-DOM description of the user's selection inside a rendered node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: TreePoint,
    pub end: TreePoint,
}

impl SelectionRange {
    pub fn new(start_index: usize, start_offset: u32, end_index: usize, end_offset: u32) -> Self {
        Self {
            start: TreePoint {
                text_index: start_index,
                offset: start_offset,
            },
            end: TreePoint {
                text_index: end_index,
                offset: end_offset,
            },
        }
    }
}
