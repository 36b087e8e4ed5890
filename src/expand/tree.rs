//! Replacement inside tree-structured (content-editable) regions
//!
//! Two paths produce the text around the caret:
//! - `Precise`: a range ending at the caret can be positioned, so the
//!   before/after text comes straight from range boundaries.
//! - `Flattened`: the caret geometry is stale, so the caret is clamped to
//!   its anchor and the region's full text is split at that point.
//!
//! Either way the region's content is then replaced by a single text node
//! (formatting inside the region is flattened) and the caret is placed in
//! the first text leaf. For a valid caret both paths yield the same text.

use tracing::{debug, warn};

use crate::dom::{text_offset_within, Caret, Document, NodeId, Range, RangeError};
use crate::utils::{char_len, char_prefix, char_suffix_from};

use super::resolver::text_after_caret;

/// Which strategy produced the edit text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPath {
    Precise,
    Flattened,
}

impl EditPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precise => "precise",
            Self::Flattened => "flattened",
        }
    }
}

/// Full region text split at the caret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditText {
    pub before: String,
    pub after: String,
    pub path: EditPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEdit {
    Applied {
        /// New text content of the region
        text: String,
        /// Caret placed in the first text leaf, if the region has one
        caret: Option<Caret>,
        /// Intended caret offset from the region start, before clamping
        caret_offset: usize,
        path: EditPath,
    },
    /// The span did not fit in the text before the caret; nothing changed
    Aborted,
}

/// Split the region's text at `caret`, preferring precise range
/// boundaries and falling back to flattening.
pub fn resolve_edit_text(doc: &Document, region: NodeId, caret: Caret, span_len: usize) -> EditText {
    match precise_edit_text(doc, region, caret, span_len) {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, "Precise edit range unavailable, flattening");
            flattened_edit_text(doc, region, caret)
        }
    }
}

fn precise_edit_text(
    doc: &Document,
    region: NodeId,
    caret: Caret,
    span_len: usize,
) -> Result<EditText, RangeError> {
    let mut deletion = Range::collapsed(caret);
    deletion.set_start(doc, caret.node, caret.offset.saturating_sub(span_len))?;

    let mut before = Range::select_node_contents(doc, region);
    before.set_end(doc, caret.node, caret.offset)?;

    Ok(EditText {
        before: before.to_string(doc),
        after: text_after_caret(doc, region, caret),
        path: EditPath::Precise,
    })
}

fn flattened_edit_text(doc: &Document, region: NodeId, caret: Caret) -> EditText {
    let full = doc.text_content(region);
    let split = if doc.contains(region, caret.node) {
        let clamped = Caret {
            node: caret.node,
            offset: caret.offset.min(doc.node_length(caret.node)),
        };
        text_offset_within(doc, region, clamped)
    } else {
        char_len(&full)
    };

    EditText {
        before: char_prefix(&full, split).to_string(),
        after: char_suffix_from(&full, split).to_string(),
        path: EditPath::Flattened,
    }
}

/// Replace the trailing `span_len` chars of `edit.before` with `body` plus
/// a space, flattening the region, and move the caret after the insertion.
///
/// Aborts without touching the document when `edit.before` is shorter than
/// the span.
pub fn apply_tree_edit(
    doc: &mut Document,
    region: NodeId,
    edit: &EditText,
    span_len: usize,
    body: &str,
) -> TreeEdit {
    let Some(start) = char_len(&edit.before).checked_sub(span_len) else {
        warn!(
            before_len = char_len(&edit.before),
            span_len, "Trigger span longer than text before caret, aborting"
        );
        return TreeEdit::Aborted;
    };

    let mut text = String::with_capacity(edit.before.len() + body.len() + edit.after.len() + 1);
    text.push_str(char_prefix(&edit.before, start));
    text.push_str(body);
    text.push(' ');
    text.push_str(&edit.after);

    doc.set_text_content(region, &text);

    let caret_offset = start + char_len(body) + 1;
    let caret = doc.first_text_leaf(region).map(|leaf| {
        let offset = caret_offset.min(doc.node_length(leaf));
        Caret { node: leaf, offset }
    });
    if let Some(caret) = caret {
        doc.set_caret(caret.node, caret.offset);
    }

    doc.dispatch_input_event(region);

    TreeEdit::Applied {
        text,
        caret,
        caret_offset,
        path: edit.path,
    }
}
