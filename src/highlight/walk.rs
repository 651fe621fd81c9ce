//! Allowed-text walk
//!
//! The single traversal primitive shared by the offset mapper and the
//! highlight injector. Both must see text nodes in the same order, skip
//! the same forbidden zones and count in the same unit, or stored offsets
//! drift on re-render. Keeping one walker makes the two coordinate
//! systems identical by construction.
//!
//! Rules:
//! - text nodes are visited in document order;
//! - a text node is *forbidden* when any ancestor (the content root
//!   included) is `code`, `pre` or `math`, or carries a class starting
//!   with `katex`;
//! - the shared cursor advances only over allowed text;
//! - the cursor unit is UTF-16 code units, matching DOM `Range` offsets.

use super::tree::MdNode;

/// Class prefix marking KaTeX output subtrees.
pub const KATEX_CLASS_PREFIX: &str = "katex";

const FORBIDDEN_TAGS: [&str; 3] = ["code", "pre", "math"];

/// Whether an element starts a forbidden zone.
pub fn is_forbidden_element(tag: &str, classes: &[String]) -> bool {
    FORBIDDEN_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t))
        || classes.iter().any(|c| c.starts_with(KATEX_CLASS_PREFIX))
}

/// One text node as seen by the walk.
pub struct TextSlot<'a> {
    /// The text node's value.
    pub value: &'a str,
    /// Value length in UTF-16 code units.
    pub len16: u32,
    /// Document-order index over all text nodes (forbidden included).
    pub text_index: usize,
    /// Allowed-text cursor at the start of this node.
    pub cursor: u32,
    /// True when the node sits inside a forbidden zone.
    pub forbidden: bool,
    /// Child-index path from the root to this text node.
    pub path: &'a [usize],
}

/// Visitor verdict: keep walking or stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

struct WalkState {
    cursor: u32,
    text_index: usize,
    path: Vec<usize>,
}

/// Visit every text node under `root` in document order.
///
/// The cursor handed to the visitor only ever advances over allowed text;
/// forbidden slots are still visited (with `forbidden: true`) so callers
/// can detect endpoints that land inside them.
pub fn walk_text_slots<F>(root: &MdNode, visit: &mut F)
where
    F: FnMut(&TextSlot<'_>) -> Step,
{
    let mut state = WalkState {
        cursor: 0,
        text_index: 0,
        path: Vec::new(),
    };
    let root_forbidden = match root {
        MdNode::Element { tag, classes, .. } => is_forbidden_element(tag, classes),
        MdNode::Text { .. } => false,
    };
    walk_node(root, root_forbidden, &mut state, visit);
}

fn walk_node<F>(node: &MdNode, forbidden: bool, state: &mut WalkState, visit: &mut F) -> Step
where
    F: FnMut(&TextSlot<'_>) -> Step,
{
    match node {
        MdNode::Text { value } => {
            let len16 = utf16_len(value);
            let slot = TextSlot {
                value,
                len16,
                text_index: state.text_index,
                cursor: state.cursor,
                forbidden,
                path: &state.path,
            };
            let step = visit(&slot);
            state.text_index += 1;
            if !forbidden {
                state.cursor += len16;
            }
            step
        }
        MdNode::Element { children, .. } => {
            for (idx, child) in children.iter().enumerate() {
                let child_forbidden = forbidden
                    || match child {
                        MdNode::Element { tag, classes, .. } => is_forbidden_element(tag, classes),
                        MdNode::Text { .. } => false,
                    };
                state.path.push(idx);
                let step = walk_node(child, child_forbidden, state, visit);
                state.path.pop();
                if step == Step::Stop {
                    return Step::Stop;
                }
            }
            Step::Continue
        }
    }
}

/// Concatenation of all allowed text under `root` — the coordinate system
/// highlights are addressed in.
pub fn allowed_text(root: &MdNode) -> String {
    let mut buf = String::new();
    walk_text_slots(root, &mut |slot| {
        if !slot.forbidden {
            buf.push_str(slot.value);
        }
        Step::Continue
    });
    buf
}

/// String length in UTF-16 code units.
pub fn utf16_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16() as u32).sum()
}

/// Byte index of the UTF-16 position `idx`, clamped to the string end.
/// A position falling inside a surrogate pair snaps to the following
/// boundary.
pub fn utf16_to_byte(s: &str, idx: u32) -> usize {
    let mut units = 0u32;
    for (byte, ch) in s.char_indices() {
        if units >= idx {
            return byte;
        }
        units += ch.len_utf16() as u32;
    }
    s.len()
}

/// Slice `s` by UTF-16 offsets, clamped.
pub fn slice_utf16(s: &str, start: u32, end: u32) -> &str {
    if end <= start {
        return "";
    }
    let b0 = utf16_to_byte(s, start);
    let b1 = utf16_to_byte(s, end);
    &s[b0..b1]
}
