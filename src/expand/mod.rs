//! Keystroke-driven `#token` expansion
//!
//! - `matcher`: find `#token` at the end of the text before the caret
//! - `flat`: splice a body into an `INPUT` / `TEXTAREA` value
//! - `resolver`: linear text around a caret in a content-editable tree
//! - `tree`: splice a body into a content-editable region
//! - `gate`: pick the surface a keystroke edits
//! - `engine`: the per-keystroke pipeline over all of the above

mod engine;
mod flat;
mod gate;
mod matcher;
mod resolver;
mod tree;

pub use engine::{
    Expansion, ExpansionEngine, ExpansionOutcome, ExpansionSettings, ExpandedSurface, SkipReason,
    DEFAULT_FLAT_INPUT_TYPES, DEFAULT_TRIGGER_KEY,
};
pub use flat::{replace_flat, FlatEdit};
pub use gate::{classify_target, editable_region_for_selection, is_flat_control, SurfaceTarget};
pub use matcher::{find_trailing_trigger, is_token_char, TriggerMatch, TRIGGER_MARKER};
pub use resolver::{text_after_caret, text_before_caret, DEFAULT_LOOKBACK};
pub use tree::{apply_tree_edit, resolve_edit_text, EditPath, EditText, TreeEdit};

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
