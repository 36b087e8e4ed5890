//! Shared char-offset helpers
//!
//! Every offset the engine exposes (carets, selections, text-node offsets)
//! counts Unicode scalar values. These helpers translate between those
//! offsets and the byte offsets `str` slicing needs.

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `char_offset`-th char, clamped to the end of `text`.
///
/// # Examples
///
/// ```
/// use hash_expand::utils::byte_offset;
///
/// assert_eq!(byte_offset("héllo", 2), 3);
/// assert_eq!(byte_offset("abc", 10), 3);
/// ```
pub fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// The first `count` chars of `text`.
pub fn char_prefix(text: &str, count: usize) -> &str {
    &text[..byte_offset(text, count)]
}

/// Everything after the first `count` chars of `text`.
pub fn char_suffix_from(text: &str, count: usize) -> &str {
    &text[byte_offset(text, count)..]
}

/// The last `count` chars of `text`.
///
/// ```
/// use hash_expand::utils::last_chars;
///
/// assert_eq!(last_chars("hello", 3), "llo");
/// assert_eq!(last_chars("hi", 3), "hi");
/// ```
pub fn last_chars(text: &str, count: usize) -> &str {
    let len = char_len(text);
    if len <= count {
        return text;
    }
    char_suffix_from(text, len - count)
}
