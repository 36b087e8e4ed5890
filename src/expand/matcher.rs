//! Trailing trigger detection
//!
//! Finds `#token` at the very end of the text before the caret. Scans
//! backwards from the end, so the cost is bounded by the token length plus
//! the char count needed to report the start offset.

use crate::utils::char_len;

/// Marker that introduces a trigger token
pub const TRIGGER_MARKER: char = '#';

/// A trigger found at the end of a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Token without the marker (`sig`)
    pub token: String,
    /// Full matched text including the marker (`#sig`)
    pub span: String,
    /// Char offset in the scanned text where `span` starts
    pub start: usize,
}

impl TriggerMatch {
    /// Length of the span in chars.
    pub fn span_len(&self) -> usize {
        // Marker and token chars are all ASCII.
        self.span.len()
    }
}

/// Characters allowed in a token: ASCII letters, digits, `_` and `-`.
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Match `#[A-Za-z0-9_-]+` anchored at the end of `text_before`.
///
/// Only the rightmost unbroken run of token characters is considered, and
/// it must be preceded directly by the marker.
///
/// # Examples
///
/// ```
/// use hash_expand::expand::find_trailing_trigger;
///
/// let m = find_trailing_trigger("hello #sig").unwrap();
/// assert_eq!(m.token, "sig");
/// assert_eq!(m.span, "#sig");
/// assert_eq!(m.start, 6);
///
/// assert!(find_trailing_trigger("hello #sig ").is_none());
/// ```
pub fn find_trailing_trigger(text_before: &str) -> Option<TriggerMatch> {
    let mut token_start = text_before.len();
    for (idx, c) in text_before.char_indices().rev() {
        if is_token_char(c) {
            token_start = idx;
            continue;
        }
        if c != TRIGGER_MARKER || token_start == text_before.len() {
            return None;
        }
        let span = &text_before[idx..];
        return Some(TriggerMatch {
            token: text_before[token_start..].to_string(),
            span: span.to_string(),
            start: char_len(&text_before[..idx]),
        });
    }
    None
}
