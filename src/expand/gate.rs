//! Keystroke target classification
//!
//! Decides which surface a key event edits, without holding any state
//! between keystrokes.

use crate::dom::{Caret, Document, NodeId};

use super::engine::SkipReason;

/// `type` assumed for an `INPUT` without one
pub const DEFAULT_INPUT_TYPE: &str = "text";

/// The surface a keystroke will edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTarget {
    /// `INPUT` / `TEXTAREA` whose value is a single flat string
    Flat { control: NodeId },
    /// Content-editable region and the caret inside it
    Tree { region: NodeId, caret: Caret },
}

/// `TEXTAREA`, or an `INPUT` whose type (case-insensitive, missing means
/// `text`) is one of `flat_types`.
pub fn is_flat_control(doc: &Document, id: NodeId, flat_types: &[String]) -> bool {
    let Some(element) = doc.element(id) else {
        return false;
    };
    match element.tag.as_str() {
        "TEXTAREA" => true,
        "INPUT" => {
            let input_type = element
                .control
                .as_ref()
                .and_then(|control| control.input_type.as_deref())
                .unwrap_or(DEFAULT_INPUT_TYPE);
            flat_types
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(input_type))
        }
        _ => false,
    }
}

/// A flat control or an effectively content-editable element.
pub fn is_editable(doc: &Document, id: NodeId, flat_types: &[String]) -> bool {
    is_flat_control(doc, id, flat_types) || doc.is_content_editable(id)
}

/// Nearest editable element at or above the selection anchor.
///
/// Returns `None` when the anchor has no editable ancestor or when the
/// nearest one is not content-editable (a caret inside a form control's
/// subtree is not a tree surface).
pub fn editable_region_for_selection(
    doc: &Document,
    anchor: NodeId,
    flat_types: &[String],
) -> Option<NodeId> {
    let mut current = if doc.is_text(anchor) {
        doc.parent_element(anchor)
    } else {
        Some(anchor)
    };
    while let Some(node) = current {
        if is_editable(doc, node, flat_types) {
            return doc.is_content_editable(node).then_some(node);
        }
        current = doc.parent_element(node);
    }
    None
}

/// Classify the key event `target`.
///
/// A flat control target wins. Otherwise, whether the target is itself
/// content-editable or not, the selection anchor decides the tree region.
pub fn classify_target(
    doc: &Document,
    target: NodeId,
    flat_types: &[String],
) -> Result<SurfaceTarget, SkipReason> {
    if is_flat_control(doc, target, flat_types) {
        return Ok(SurfaceTarget::Flat { control: target });
    }

    let Some(caret) = doc.selection() else {
        return if doc.is_content_editable(target) {
            Err(SkipReason::NoSelection)
        } else {
            Err(SkipReason::NoEditableSurface)
        };
    };

    editable_region_for_selection(doc, caret.node, flat_types)
        .map(|region| SurfaceTarget::Tree { region, caret })
        .ok_or(SkipReason::NoEditableSurface)
}
