//! Linear text around a caret inside a tree-structured region
//!
//! The "before" text is what the matcher scans. It is assembled lazily from
//! the caret outward and never grows past the lookback limit, so a huge
//! region costs no more than a small one per keystroke.

use tracing::debug;

use crate::dom::{Caret, Document, NodeId, Range};
use crate::utils::{char_len, char_prefix, last_chars};

/// Default number of chars inspected before the caret
pub const DEFAULT_LOOKBACK: usize = 200;

enum Seed {
    /// Text from a leaf at or just before the caret; extend from `from`.
    Leaf { text: String, from: NodeId },
    /// Region text from its start up to the caret; already complete.
    Structural(String),
}

/// Up to `limit` chars of region text immediately before `caret`.
///
/// The walk goes to previous siblings, then up to the parent and its
/// previous siblings, and never crosses `region`. Offsets past the anchor's
/// length are clamped.
pub fn text_before_caret(doc: &Document, region: NodeId, caret: Caret, limit: usize) -> String {
    let (seed, mut walker) = match seed_text(doc, region, caret) {
        Seed::Leaf { text, from } => (text, from),
        Seed::Structural(text) => return last_chars(&text, limit).to_string(),
    };

    let mut collected = last_chars(&seed, limit).to_string();
    let mut collected_len = char_len(&collected);

    while collected_len < limit && walker != region {
        if let Some(prev) = doc.previous_sibling(walker) {
            walker = prev;
            let tail = tail_text(doc, prev, limit - collected_len);
            collected_len += char_len(&tail);
            collected.insert_str(0, &tail);
        } else {
            match doc.parent(walker) {
                Some(parent) if parent != region => walker = parent,
                _ => break,
            }
        }
    }

    last_chars(&collected, limit).to_string()
}

/// Region text from `caret` to the region's end.
///
/// Returns an empty string when the caret cannot be used as a range
/// boundary.
pub fn text_after_caret(doc: &Document, region: NodeId, caret: Caret) -> String {
    let mut range = Range::select_node_contents(doc, region);
    match range.set_start(doc, caret.node, caret.offset) {
        Ok(()) => range.to_string(doc),
        Err(e) => {
            debug!(error = %e, "Caret unusable for trailing text, treating as empty");
            String::new()
        }
    }
}

fn seed_text(doc: &Document, region: NodeId, caret: Caret) -> Seed {
    if let Some(text) = doc.text(caret.node) {
        return Seed::Leaf {
            text: char_prefix(text, caret.offset).to_string(),
            from: caret.node,
        };
    }

    let previous_child = caret
        .offset
        .checked_sub(1)
        .and_then(|idx| doc.children(caret.node).get(idx).copied());
    if let Some(child) = previous_child {
        if let Some(text) = doc.text(child) {
            return Seed::Leaf {
                text: text.to_string(),
                from: child,
            };
        }
    }

    Seed::Structural(structural_before(doc, region, caret))
}

/// Region text from its start to `caret`, clamping a stale offset.
fn structural_before(doc: &Document, region: NodeId, caret: Caret) -> String {
    let offset = caret.offset.min(doc.node_length(caret.node));
    let mut range = Range::select_node_contents(doc, region);
    match range.set_end(doc, caret.node, offset) {
        Ok(()) => range.to_string(doc),
        Err(_) => String::new(),
    }
}

/// The last `limit` chars of `node`'s text content, visiting leaves from
/// the end so nothing earlier is materialized.
fn tail_text(doc: &Document, node: NodeId, limit: usize) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    let mut remaining = limit;
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        if remaining == 0 {
            break;
        }
        match doc.text(current) {
            Some(text) => {
                let piece = last_chars(text, remaining);
                remaining -= char_len(piece);
                pieces.push(piece);
            }
            None => stack.extend(doc.children(current).iter().copied()),
        }
    }

    pieces.iter().rev().copied().collect()
}
