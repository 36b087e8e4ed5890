//! Template snapshot types and store adapters
//!
//! - `TemplateMap`: token -> body, the unit every store hands out
//! - `TemplateCache`: the engine's read-mostly snapshot, replaced wholesale
//! - `TemplateStore`: the collaborator interface (`get` + `on_change`)
//! - `MemoryTemplateStore` / `FileTemplateStore`: the two adapters

mod cache;
mod store;

pub use cache::TemplateCache;
pub use store::{ChangeCallback, FileTemplateStore, MemoryTemplateStore, TemplateStore};

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Token (without the leading `#`) -> replacement body
pub type TemplateMap = BTreeMap<String, String>;

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("keyword regex is valid"));

/// Whether `keyword` can be stored as a template token.
///
/// Same alphabet the trigger matcher accepts after `#`: ASCII letters,
/// digits, underscore and hyphen.
pub fn is_valid_keyword(keyword: &str) -> bool {
    KEYWORD_RE.is_match(keyword)
}
