//! Expansion engine
//!
//! Ties the per-keystroke pipeline together:
//! gate -> text before caret -> trigger match -> template lookup -> replace.
//!
//! Keystroke handling never returns an error. Every way of not expanding is
//! a `SkipReason` (quiet, default action untouched) or `Aborted` (an
//! invariant did not hold, logged at warn).

use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::debug_panic;
use crate::dom::{Caret, Document, KeyEvent, NodeId};
use crate::error::Result;
use crate::logging;
use crate::templates::{TemplateCache, TemplateStore};
use crate::utils::{char_prefix, last_chars};

use super::flat::{commit_flat_edit, replace_flat, value_and_caret};
use super::gate::{classify_target, SurfaceTarget};
use super::matcher::find_trailing_trigger;
use super::resolver::{text_before_caret, DEFAULT_LOOKBACK};
use super::tree::{apply_tree_edit, resolve_edit_text, EditPath, TreeEdit};

/// Key that triggers expansion by default
pub const DEFAULT_TRIGGER_KEY: &str = " ";

/// Input types treated as flat buffers by default
pub const DEFAULT_FLAT_INPUT_TYPES: [&str; 3] = ["text", "search", "url"];

/// Tunables for keystroke handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionSettings {
    /// `KeyEvent::key` value that triggers expansion
    pub trigger_key: String,
    /// Max chars before the caret inspected for a trigger
    pub lookback: usize,
    /// `INPUT` types handled as flat buffers (case-insensitive)
    pub flat_input_types: Vec<String>,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            trigger_key: DEFAULT_TRIGGER_KEY.to_string(),
            lookback: DEFAULT_LOOKBACK,
            flat_input_types: DEFAULT_FLAT_INPUT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Why a keystroke was left alone
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("key {0:?} is not the trigger key")]
    NotTriggerKey(String),

    #[error("no editable surface for this keystroke")]
    NoEditableSurface,

    #[error("editable target has no selection")]
    NoSelection,

    #[error("no trailing trigger before the caret")]
    NoMatch,

    #[error("no template named '{0}'")]
    UnknownToken(String),
}

/// Which kind of surface an expansion edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandedSurface {
    Flat,
    Tree { path: EditPath },
}

impl ExpandedSurface {
    pub fn path(self) -> Option<EditPath> {
        match self {
            Self::Flat => None,
            Self::Tree { path } => Some(path),
        }
    }
}

impl fmt::Display for ExpandedSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("flat"),
            Self::Tree { path } => write!(f, "tree/{}", path.as_str()),
        }
    }
}

/// A completed expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub token: String,
    pub surface: ExpandedSurface,
    /// Element whose content changed and received the input notification
    pub target: NodeId,
    /// New caret offset from the start of the surface's text
    pub caret_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    Expanded(Expansion),
    Skipped(SkipReason),
    /// The matched span did not fit before the caret; nothing was mutated
    Aborted,
}

impl ExpansionOutcome {
    pub fn is_expanded(&self) -> bool {
        matches!(self, Self::Expanded(_))
    }
}

/// Expands `#token` + trigger key into the token's template body
pub struct ExpansionEngine {
    templates: TemplateCache,
    settings: ExpansionSettings,
}

impl ExpansionEngine {
    pub fn new(templates: TemplateCache, settings: ExpansionSettings) -> Self {
        Self {
            templates,
            settings,
        }
    }

    /// Load the store's current snapshot and keep the cache in sync with
    /// every later change.
    pub fn connect(store: &dyn TemplateStore, settings: ExpansionSettings) -> Result<Self> {
        let templates = TemplateCache::with_snapshot(store.get()?);

        let subscriber = templates.clone();
        store.on_change(Box::new(move |snapshot| {
            subscriber.apply_snapshot(snapshot.clone());
        }));

        debug!(count = templates.len(), "Expansion engine connected to template store");
        Ok(Self::new(templates, settings))
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn settings(&self) -> &ExpansionSettings {
        &self.settings
    }

    /// Handle one key press before the host does.
    ///
    /// On `Expanded` the surface has been rewritten, one `input`
    /// notification recorded on it and `event.prevent_default()` called.
    /// Any other outcome leaves both the document and the event untouched.
    #[instrument(skip_all, fields(key = %event.key, target = event.target.index()))]
    pub fn handle_key_event(&self, doc: &mut Document, event: &mut KeyEvent) -> ExpansionOutcome {
        let outcome = self.process(doc, event);
        match &outcome {
            ExpansionOutcome::Expanded(expansion) => {
                event.prevent_default();
                logging::log_expansion_event(
                    &expansion.token,
                    &expansion.surface.to_string(),
                    expansion.caret_offset,
                );
            }
            ExpansionOutcome::Skipped(reason) => {
                debug!(reason = %reason, "Keystroke skipped");
            }
            ExpansionOutcome::Aborted => {
                warn!("Expansion aborted, surface left unchanged");
            }
        }
        outcome
    }

    fn process(&self, doc: &mut Document, event: &KeyEvent) -> ExpansionOutcome {
        if event.key != self.settings.trigger_key {
            return ExpansionOutcome::Skipped(SkipReason::NotTriggerKey(event.key.clone()));
        }

        match classify_target(doc, event.target, &self.settings.flat_input_types) {
            Ok(SurfaceTarget::Flat { control }) => self.expand_flat(doc, control),
            Ok(SurfaceTarget::Tree { region, caret }) => self.expand_tree(doc, region, caret),
            Err(reason) => ExpansionOutcome::Skipped(reason),
        }
    }

    /// Body for `token`. An empty body is a real template: it expands to
    /// the trailing space alone, deleting the trigger.
    fn lookup(&self, token: &str) -> std::result::Result<String, SkipReason> {
        self.templates
            .lookup(token)
            .ok_or_else(|| SkipReason::UnknownToken(token.to_string()))
    }

    fn expand_flat(&self, doc: &mut Document, control: NodeId) -> ExpansionOutcome {
        let Some((value, caret)) = value_and_caret(doc, control) else {
            return ExpansionOutcome::Skipped(SkipReason::NoEditableSurface);
        };

        let window = last_chars(char_prefix(&value, caret), self.settings.lookback);
        let Some(trigger) = find_trailing_trigger(window) else {
            return ExpansionOutcome::Skipped(SkipReason::NoMatch);
        };
        let body = match self.lookup(&trigger.token) {
            Ok(body) => body,
            Err(reason) => return ExpansionOutcome::Skipped(reason),
        };

        let Some(edit) = replace_flat(&value, caret, trigger.span_len(), &body) else {
            warn!(caret, span_len = trigger.span_len(), "Trigger span starts before the buffer");
            return ExpansionOutcome::Aborted;
        };

        if !commit_flat_edit(doc, control, &edit) {
            debug_panic!("flat surface {:?} lost its control state", control);
            return ExpansionOutcome::Aborted;
        }

        ExpansionOutcome::Expanded(Expansion {
            token: trigger.token,
            surface: ExpandedSurface::Flat,
            target: control,
            caret_offset: edit.caret,
        })
    }

    fn expand_tree(&self, doc: &mut Document, region: NodeId, caret: Caret) -> ExpansionOutcome {
        let before = text_before_caret(doc, region, caret, self.settings.lookback);
        let Some(trigger) = find_trailing_trigger(&before) else {
            return ExpansionOutcome::Skipped(SkipReason::NoMatch);
        };
        let body = match self.lookup(&trigger.token) {
            Ok(body) => body,
            Err(reason) => return ExpansionOutcome::Skipped(reason),
        };

        let edit_text = resolve_edit_text(doc, region, caret, trigger.span_len());
        match apply_tree_edit(doc, region, &edit_text, trigger.span_len(), &body) {
            TreeEdit::Applied {
                caret_offset, path, ..
            } => ExpansionOutcome::Expanded(Expansion {
                token: trigger.token,
                surface: ExpandedSurface::Tree { path },
                target: region,
                caret_offset,
            }),
            TreeEdit::Aborted => ExpansionOutcome::Aborted,
        }
    }
}
