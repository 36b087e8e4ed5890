//! Boundary-point ranges over a `Document`
//!
//! Mirrors the subset of DOM `Range` the engine uses. Setting a boundary
//! validates the offset against the node length, which is how stale caret
//! geometry is detected.

use std::cmp::Ordering;

use thiserror::Error;

use super::{Caret, Document, NodeId};
use crate::utils::{char_prefix, char_suffix_from};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("offset {offset} exceeds length {length} of node {node:?}")]
    IndexSize {
        node: NodeId,
        offset: usize,
        length: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: Caret,
    end: Caret,
}

impl Range {
    pub fn collapsed(at: Caret) -> Self {
        Self { start: at, end: at }
    }

    /// Range spanning every child (or every char) of `node`.
    pub fn select_node_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: Caret { node, offset: 0 },
            end: Caret {
                node,
                offset: doc.node_length(node),
            },
        }
    }

    pub fn start(&self) -> Caret {
        self.start
    }

    pub fn end(&self) -> Caret {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Move the start boundary. If it lands after the end, the range
    /// collapses to the new start.
    pub fn set_start(&mut self, doc: &Document, node: NodeId, offset: usize) -> Result<(), RangeError> {
        let boundary = checked_boundary(doc, node, offset)?;
        self.start = boundary;
        if compare_boundaries(doc, self.start, self.end) != Some(Ordering::Less) {
            self.end = boundary;
        }
        Ok(())
    }

    /// Move the end boundary. If it lands before the start, the range
    /// collapses to the new end.
    pub fn set_end(&mut self, doc: &Document, node: NodeId, offset: usize) -> Result<(), RangeError> {
        let boundary = checked_boundary(doc, node, offset)?;
        self.end = boundary;
        if compare_boundaries(doc, self.start, self.end) != Some(Ordering::Less) {
            self.start = boundary;
        }
        Ok(())
    }

    /// Text covered by the range, concatenated across text nodes.
    pub fn to_string(&self, doc: &Document) -> String {
        if self.is_collapsed() {
            return String::new();
        }
        let Some(container) = common_ancestor(doc, self.start.node, self.end.node) else {
            return String::new();
        };
        let from = text_offset_within(doc, container, self.start);
        let to = text_offset_within(doc, container, self.end);
        if to <= from {
            return String::new();
        }
        let text = doc.text_content(container);
        char_prefix(char_suffix_from(&text, from), to - from).to_string()
    }
}

fn checked_boundary(doc: &Document, node: NodeId, offset: usize) -> Result<Caret, RangeError> {
    let length = doc.node_length(node);
    if offset > length {
        return Err(RangeError::IndexSize {
            node,
            offset,
            length,
        });
    }
    Ok(Caret { node, offset })
}

/// Number of chars of `container`'s text content that precede `boundary`.
///
/// `boundary.node` must be inside `container`; offsets past the node
/// length are clamped.
pub(crate) fn text_offset_within(doc: &Document, container: NodeId, boundary: Caret) -> usize {
    let mut total = match doc.text(boundary.node) {
        Some(_) => boundary.offset.min(doc.node_length(boundary.node)),
        None => {
            let children = doc.children(boundary.node);
            let upto = boundary.offset.min(children.len());
            children[..upto].iter().map(|c| doc.text_len(*c)).sum()
        }
    };

    let mut node = boundary.node;
    while node != container {
        let Some(parent) = doc.parent(node) else {
            break;
        };
        let idx = doc.index_in_parent(node).unwrap_or(0);
        total += doc.children(parent)[..idx]
            .iter()
            .map(|c| doc.text_len(*c))
            .sum::<usize>();
        node = parent;
    }
    total
}

fn common_ancestor(doc: &Document, a: NodeId, b: NodeId) -> Option<NodeId> {
    let mut ancestors = Vec::new();
    let mut current = Some(a);
    while let Some(id) = current {
        ancestors.push(id);
        current = doc.parent(id);
    }
    let mut current = Some(b);
    while let Some(id) = current {
        if ancestors.contains(&id) {
            return Some(id);
        }
        current = doc.parent(id);
    }
    None
}

/// Child-index path from the tree root down to the boundary, with the
/// boundary offset as the last step.
fn boundary_path(doc: &Document, boundary: Caret) -> (NodeId, Vec<usize>) {
    let mut path = vec![boundary.offset];
    let mut node = boundary.node;
    while let Some(parent) = doc.parent(node) {
        path.push(doc.index_in_parent(node).unwrap_or(0));
        node = parent;
    }
    path.reverse();
    (node, path)
}

/// Tree-order comparison of two boundary points; `None` when they live in
/// disconnected trees.
pub(crate) fn compare_boundaries(doc: &Document, a: Caret, b: Caret) -> Option<Ordering> {
    let (root_a, path_a) = boundary_path(doc, a);
    let (root_b, path_b) = boundary_path(doc, b);
    if root_a != root_b {
        return None;
    }
    Some(path_a.cmp(&path_b))
}
