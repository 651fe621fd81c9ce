//! Highlight range normalization and scope addressing
//!
//! Ranges arrive from two places: freshly mapped selections (core-made,
//! well formed) and persisted highlight records that round-tripped through
//! JS and JSON (anything goes). `normalize_ranges` is the single funnel:
//! it drops garbage, sorts, and merges, so the injector only ever sees a
//! disjoint ascending list.

use serde::{Deserialize, Serialize};

/// Which rendered field of a qa pair a highlight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Question,
    Answer,
}

impl Default for Field {
    fn default() -> Self {
        Field::Answer
    }
}

/// Identifies exactly which rendered question or answer block a
/// highlight/selection belongs to. `qa_index: -1` means "unscoped"
/// (legacy records that predate per-field addressing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightScope {
    pub qa_index: i32,
    #[serde(default)]
    pub field: Field,
}

impl Default for HighlightScope {
    fn default() -> Self {
        Self {
            qa_index: -1,
            field: Field::Answer,
        }
    }
}

impl HighlightScope {
    pub fn new(qa_index: i32, field: Field) -> Self {
        Self { qa_index, field }
    }
}

/// A half-open `[start, end)` range over the allowed-text coordinate
/// system. Kept in f64 on the way in because persisted records may carry
/// anything a JS number can hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRange {
    pub start: f64,
    pub end: f64,
}

impl RawRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Shift both bounds, e.g. to re-base field-local offsets onto a
    /// rendered block that carries a heading prefix.
    pub fn shift(self, delta: f64) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }
}

/// A validated range in UTF-16 units. Signed so that records addressed
/// just before a rendered prefix survive the round trip instead of
/// wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

/// Merge and normalize ranges: drop non-finite or empty/inverted ranges,
/// sort ascending by start, and coalesce overlapping or touching
/// neighbours. Output is disjoint, sorted and minimal.
pub fn normalize_ranges(ranges: &[RawRange]) -> Vec<Span> {
    let mut sorted: Vec<RawRange> = ranges
        .iter()
        .filter(|r| r.start.is_finite() && r.end.is_finite() && r.end > r.start)
        .copied()
        .collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Span> = Vec::new();
    for r in sorted {
        let (start, end) = (r.start.floor() as i64, r.end.floor() as i64);
        match merged.last_mut() {
            Some(last) if start <= last.end => {
                last.end = last.end.max(end);
            }
            _ => merged.push(Span::new(start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(f64, f64)]) -> Vec<RawRange> {
        pairs.iter().map(|&(s, e)| RawRange::new(s, e)).collect()
    }

    #[test]
    fn merge_law() {
        let out = normalize_ranges(&raw(&[(0.0, 5.0), (3.0, 8.0), (10.0, 12.0)]));
        assert_eq!(out, vec![Span::new(0, 8), Span::new(10, 12)]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(normalize_ranges(&[]).is_empty());
    }

    #[test]
    fn touching_ranges_merge_disjoint_do_not() {
        let out = normalize_ranges(&raw(&[(0.0, 5.0), (5.0, 7.0), (9.0, 10.0)]));
        assert_eq!(out, vec![Span::new(0, 7), Span::new(9, 10)]);
    }

    #[test]
    fn drops_inverted_empty_and_non_finite() {
        let out = normalize_ranges(&raw(&[
            (4.0, 4.0),
            (9.0, 2.0),
            (f64::NAN, 3.0),
            (1.0, f64::INFINITY),
            (2.0, 6.0),
        ]));
        assert_eq!(out, vec![Span::new(2, 6)]);
    }

    #[test]
    fn unsorted_input_comes_out_sorted() {
        let out = normalize_ranges(&raw(&[(10.0, 12.0), (0.0, 2.0), (4.0, 6.0)]));
        assert_eq!(
            out,
            vec![Span::new(0, 2), Span::new(4, 6), Span::new(10, 12)]
        );
    }
}
