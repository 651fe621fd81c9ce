//! Highlight injector
//!
//! Tree transform that re-applies stored highlight ranges to a freshly
//! rendered Markdown tree: text nodes intersecting a range are split into
//! literal fragments plus `<mark class="md-highlight">` wrappers. Works in
//! the same allowed-text coordinate system as the offset mapper — the
//! shared walk guarantees that.
//!
//! Two phases, as the safe rehype variant in the original: phase one only
//! reads the tree and stages `(path, fragments)` edits; phase two applies
//! them from the back of the document forward so earlier indices stay
//! valid. A tree that fails validation is returned untouched.

use super::ranges::{normalize_ranges, RawRange, Span};
use super::tree::MdNode;
use super::walk::{slice_utf16, walk_text_slots, Step};
use crate::log;

/// Class applied to injected highlight markers.
pub const HIGHLIGHT_CLASS: &str = "md-highlight";

struct Edit {
    path: Vec<usize>,
    fragments: Vec<MdNode>,
}

/// Split text nodes and wrap every matched span of `ranges` in a
/// highlight marker. Ranges are normalized first; zero ranges is a no-op.
/// Never panics: a malformed tree is logged and left unmodified.
pub fn inject_ranges(tree: &mut MdNode, ranges: &[RawRange]) {
    let merged = normalize_ranges(ranges);
    if merged.is_empty() {
        return;
    }

    let edits = stage_edits(tree, &merged);
    if edits.is_empty() {
        return;
    }
    if let Err(err) = apply_edits(tree, edits) {
        log::warn(&format!("[inject_ranges] skipped: {err}"));
    }
}

/// Phase one: walk allowed text and collect the splice operations.
fn stage_edits(tree: &MdNode, merged: &[Span]) -> Vec<Edit> {
    let mut edits = Vec::new();
    walk_text_slots(tree, &mut |slot| {
        // Forbidden text never advances the cursor and never matches.
        if slot.forbidden || slot.len16 == 0 || slot.path.is_empty() {
            return Step::Continue;
        }
        let node_start = slot.cursor as i64;
        let node_end = node_start + slot.len16 as i64;

        // Half-open interval intersection on the allowed coordinate system.
        let hits: Vec<&Span> = merged
            .iter()
            .filter(|r| r.start < node_end && r.end > node_start)
            .collect();
        if hits.is_empty() {
            return Step::Continue;
        }

        let mut fragments = Vec::new();
        let mut pos: u32 = 0;
        for r in hits {
            let s = (r.start - node_start).clamp(0, slot.len16 as i64) as u32;
            let e = (r.end - node_start).clamp(0, slot.len16 as i64) as u32;
            if e <= s {
                continue;
            }
            if s > pos {
                fragments.push(MdNode::text(slice_utf16(slot.value, pos, s)));
            }
            fragments.push(MdNode::element_with_class(
                "mark",
                HIGHLIGHT_CLASS,
                vec![MdNode::text(slice_utf16(slot.value, s, e))],
            ));
            pos = e;
        }
        if pos < slot.len16 {
            fragments.push(MdNode::text(slice_utf16(slot.value, pos, slot.len16)));
        }
        if !fragments.is_empty() {
            edits.push(Edit {
                path: slot.path.to_vec(),
                fragments,
            });
        }
        Step::Continue
    });
    edits
}

/// Phase two: validate every staged path, then splice from the highest
/// document position down. A splice at index `i` only shifts siblings
/// after `i`, which sort lexicographically greater and are already done.
fn apply_edits(tree: &mut MdNode, mut edits: Vec<Edit>) -> Result<(), String> {
    for edit in &edits {
        let target = node_at(tree, &edit.path)
            .ok_or_else(|| format!("stale edit path {:?}", edit.path))?;
        if !target.is_text() {
            return Err(format!("edit path {:?} is not a text node", edit.path));
        }
    }

    edits.sort_by(|a, b| b.path.cmp(&a.path));
    for edit in edits {
        let (parent_path, idx) = edit.path.split_at(edit.path.len() - 1);
        let parent = node_at_mut(tree, parent_path)
            .ok_or_else(|| format!("lost parent at {:?}", parent_path))?;
        match parent {
            MdNode::Element { children, .. } => {
                children.splice(idx[0]..idx[0] + 1, edit.fragments);
            }
            MdNode::Text { .. } => return Err("text node as parent".into()),
        }
    }
    Ok(())
}

fn node_at<'a>(root: &'a MdNode, path: &[usize]) -> Option<&'a MdNode> {
    let mut node = root;
    for &idx in path {
        node = node.children().get(idx)?;
    }
    Some(node)
}

fn node_at_mut<'a>(root: &'a mut MdNode, path: &[usize]) -> Option<&'a mut MdNode> {
    let mut node = root;
    for &idx in path {
        node = match node {
            MdNode::Element { children, .. } => children.get_mut(idx)?,
            MdNode::Text { .. } => return None,
        };
    }
    Some(node)
}
