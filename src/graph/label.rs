//! Label builder
//!
//! Assembles the full displayable Markdown of a node from its
//! question/answer history: optional background preamble (the reference
//! context captured from the parent's highlight), then each qa pair as a
//! question block and an answer block. The produced string is the
//! fallback content; the canonical renderer iterates `context` and
//! renders each pair independently so every answer carries its own
//! scoped highlights.
//!
//! `LabelFormat` also owns the *measured* rendered-prefix length per
//! field. The heading markup in front of a question ("## Question: "
//! renders as the text "Question: ") is part of the DOM but not of the
//! semantic text; offsets are re-based past it. Measuring the prefix from
//! the format strings keeps the offset mapper honest if the heading text
//! ever changes.

use serde::{Deserialize, Serialize};

use super::model::NodeData;
use crate::highlight::ranges::Field;
use crate::highlight::walk::utf16_len;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFormat {
    /// Markdown prefix of a rendered question block.
    pub question_heading: String,
    /// Markdown prefix of a rendered answer block (fallback label only;
    /// scoped answer renders are bare).
    pub answer_heading: String,
    /// Quote label of the background preamble.
    pub background_label: String,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            question_heading: "## Question: ".into(),
            answer_heading: "## Answer: ".into(),
            background_label: "> Background: ".into(),
        }
    }
}

impl LabelFormat {
    /// Rendered UTF-16 prefix length of a field's block — the explicit
    /// replacement for the fixed offset constant.
    pub fn prefix_len(&self, field: Field) -> u32 {
        match field {
            // "## Question: " renders as the heading text "Question: "
            Field::Question => utf16_len(self.rendered_question_prefix()),
            // scoped answer blocks render the raw response, no heading
            Field::Answer => 0,
        }
    }

    fn rendered_question_prefix(&self) -> &str {
        self.question_heading
            .trim_start_matches('#')
            .trim_start_matches(' ')
    }

    /// Build the node's full Markdown label.
    ///
    /// The new pair replaces the last stored pair when that one is still
    /// pending — a submit-then-answer sequence must not duplicate the
    /// in-flight pair. An explicitly passed `reference_context` wins over
    /// the one stored on the node.
    pub fn build_label(
        &self,
        node: Option<&NodeData>,
        question: &str,
        answer: Option<&str>,
        reference_context: Option<&str>,
    ) -> String {
        let context: &[_] = node.map(|d| d.context.as_slice()).unwrap_or(&[]);
        let settled = match context.last() {
            Some(last) if last.llm_response.is_none() => &context[..context.len() - 1],
            _ => context,
        };

        let mut parts: Vec<String> = Vec::new();
        let stored = node.and_then(|d| d.reference_context.as_deref());
        if let Some(ctx) = reference_context
            .filter(|c| !c.is_empty())
            .or_else(|| stored.filter(|c| !c.is_empty()))
        {
            parts.push(format!("{}\n{ctx}\n", self.background_label));
            parts.push("---\n".into());
        }

        let mut blocks: Vec<String> = Vec::new();
        for (q, a) in settled
            .iter()
            .map(|qa| (qa.question.as_str(), qa.llm_response.as_deref()))
            .chain(std::iter::once((question, answer)))
        {
            let mut inner: Vec<String> = Vec::new();
            if !q.is_empty() {
                inner.push(format!("{}{q}\n", self.question_heading));
            }
            inner.push("---\n".into());
            if let Some(a) = a.filter(|a| !a.is_empty()) {
                inner.push(format!("{}\n{a}\n", self.answer_heading));
            }
            blocks.push(inner.join("\n"));
        }
        parts.push(blocks.join("\n---\n"));
        parts.concat()
    }
}
