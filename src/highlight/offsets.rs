//! Offset mapper
//!
//! Maps a DOM selection (re-addressed as text-node index + UTF-16 offset
//! pairs) to character offsets in the allowed-text coordinate system of a
//! rendered field. Offsets computed here are what gets persisted in a
//! highlight record and what the injector later re-applies, so the walk
//! must match the injector's exactly — both go through
//! [`walk_text_slots`](super::walk::walk_text_slots).
//!
//! The rendered block may start with a fixed heading prefix ("Question: "
//! etc.) that is part of the DOM but not of the semantic text; its
//! measured UTF-16 length is subtracted so stored offsets address only
//! the meaningful content. The prefix length comes from the label format
//! rather than a hardcoded constant.

use super::ranges::Span;
use super::tree::{MdNode, SelectionRange};
use super::walk::{walk_text_slots, Step};

/// Compute `[start, end)` allowed-text offsets for a selection under
/// `root`, minus `prefix_len` (the measured rendered-prefix length of the
/// field, in UTF-16 units).
///
/// Returns `None` when either endpoint sits in a forbidden zone (code,
/// pre, math, KaTeX), when an endpoint index is out of range, or when the
/// selection collapses to nothing after prefix subtraction. Pure function
/// of the tree and range.
pub fn compute_offsets(root: &MdNode, range: &SelectionRange, prefix_len: u32) -> Option<Span> {
    let mut start: Option<i64> = None;
    let mut end: Option<i64> = None;

    walk_text_slots(root, &mut |slot| {
        // Forbidden text is not part of the coordinate system; an endpoint
        // landing there stays unresolved.
        if slot.forbidden {
            return Step::Continue;
        }
        if slot.text_index == range.start.text_index {
            start = Some(slot.cursor as i64 + range.start.offset.min(slot.len16) as i64);
        }
        if slot.text_index == range.end.text_index {
            end = Some(slot.cursor as i64 + range.end.offset.min(slot.len16) as i64);
            return Step::Stop;
        }
        Step::Continue
    });

    let (start, end) = (start?, end?);
    if start == end {
        return None;
    }
    // Selections reaching into the prefix clamp to its end; a selection
    // entirely inside the prefix addresses nothing.
    let start = (start - prefix_len as i64).max(0);
    let end = end - prefix_len as i64;
    if end <= start {
        return None;
    }
    Some(Span::new(start, end))
}
