//! Headless keystroke simulation
//!
//! Builds a throwaway `Document` for one surface, delivers a single key
//! press to an `ExpansionEngine` and reports what happened. Used by the
//! `hash-expand` binary; every report serializes to one JSON line.

use serde::Serialize;

use crate::dom::{ContentEditable, Document, KeyEvent};
use crate::expand::{ExpansionEngine, ExpansionOutcome};

/// Result of one simulated keystroke
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionReport {
    /// `expanded`, `skipped` or `aborted`
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// `flat`, `tree/precise` or `tree/flattened`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Surface text after the keystroke
    pub text: String,
    /// Caret after the keystroke, if the surface has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caret: Option<usize>,
    pub default_prevented: bool,
}

impl ExpansionReport {
    fn new(outcome: &ExpansionOutcome, text: String, caret: Option<usize>, event: &KeyEvent) -> Self {
        let (label, token, surface, reason) = match outcome {
            ExpansionOutcome::Expanded(expansion) => (
                "expanded",
                Some(expansion.token.clone()),
                Some(expansion.surface.to_string()),
                None,
            ),
            ExpansionOutcome::Skipped(reason) => ("skipped", None, None, Some(reason.to_string())),
            ExpansionOutcome::Aborted => ("aborted", None, None, None),
        };
        Self {
            outcome: label,
            token,
            surface,
            reason,
            text,
            caret,
            default_prevented: event.default_prevented(),
        }
    }
}

/// Press `key` in a `TEXTAREA` holding `text`. `caret` defaults to the end.
pub fn simulate_flat(
    engine: &ExpansionEngine,
    text: &str,
    caret: Option<usize>,
    key: &str,
) -> ExpansionReport {
    let mut doc = Document::new();
    let root = doc.root();
    let area = doc.append_textarea(root, text);
    if let (Some(caret), Some(state)) = (caret, doc.control_mut(area)) {
        state.selection_start = caret;
        state.selection_end = caret;
    }

    let mut event = KeyEvent::new(key, area);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    let (value, caret) = doc
        .control(area)
        .map(|state| (state.value.clone(), Some(state.selection_start)))
        .unwrap_or_default();
    ExpansionReport::new(&outcome, value, caret, &event)
}

/// Press `key` in a content-editable `DIV` with one text node per segment,
/// the caret at the end of the last segment.
pub fn simulate_tree(engine: &ExpansionEngine, segments: &[String], key: &str) -> ExpansionReport {
    let mut doc = Document::new();
    let root = doc.root();
    let div = doc.append_element(root, "div");
    doc.set_content_editable(div, ContentEditable::True);

    let mut last = None;
    for segment in segments {
        last = Some((doc.append_text(div, segment), segment.chars().count()));
    }
    match last {
        Some((leaf, len)) => doc.set_caret(leaf, len),
        None => doc.set_caret(div, 0),
    }

    let mut event = KeyEvent::new(key, div);
    let outcome = engine.handle_key_event(&mut doc, &mut event);

    let caret = doc.selection().map(|caret| caret.offset);
    ExpansionReport::new(&outcome, doc.text_content(div), caret, &event)
}
