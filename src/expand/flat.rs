//! Flat-buffer replacement for `INPUT` / `TEXTAREA` values

use crate::dom::{Document, NodeId};
use crate::utils::{char_len, char_prefix, char_suffix_from};

/// Result of splicing a template into a flat buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEdit {
    pub text: String,
    /// New caret offset, just after the inserted body and its trailing space
    pub caret: usize,
}

/// Replace the `span_len` chars before `caret` with `body` plus a space.
///
/// Returns `None` when the span would start before the buffer (the caret
/// is clamped to the buffer length first).
///
/// ```
/// use hash_expand::expand::replace_flat;
///
/// let edit = replace_flat("hello #sig", 10, 4, "Best regards,\nAlex").unwrap();
/// assert_eq!(edit.text, "hello Best regards,\nAlex ");
/// assert_eq!(edit.caret, 25);
/// ```
pub fn replace_flat(buffer: &str, caret: usize, span_len: usize, body: &str) -> Option<FlatEdit> {
    let caret = caret.min(char_len(buffer));
    let start = caret.checked_sub(span_len)?;

    let mut text = String::with_capacity(buffer.len() + body.len() + 1);
    text.push_str(char_prefix(buffer, start));
    text.push_str(body);
    text.push(' ');
    text.push_str(char_suffix_from(buffer, caret));

    Some(FlatEdit {
        text,
        caret: start + char_len(body) + 1,
    })
}

/// A form control's value and its caret (`selection_start`, clamped).
pub(crate) fn value_and_caret(doc: &Document, control: NodeId) -> Option<(String, usize)> {
    let state = doc.control(control)?;
    let caret = state.selection_start.min(char_len(&state.value));
    Some((state.value.clone(), caret))
}

/// Write `edit` into the control and notify the host.
pub(crate) fn commit_flat_edit(doc: &mut Document, control: NodeId, edit: &FlatEdit) -> bool {
    let Some(state) = doc.control_mut(control) else {
        return false;
    };
    state.set_value(edit.text.clone(), edit.caret);
    doc.dispatch_input_event(control);
    true
}
