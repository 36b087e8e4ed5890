//! Configuration type definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::error::{ExpandError, Result};
use crate::expand::ExpansionSettings;

/// Contents of `config.json`. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Key that triggers expansion, as reported by the host (default: " ")
    #[serde(default = "default_trigger_key")]
    pub trigger_key: String,
    /// Max chars before the caret searched for a trigger (default: 200)
    #[serde(default = "default_lookback_chars")]
    pub lookback_chars: usize,
    /// `INPUT` types edited as flat buffers (default: text, search, url)
    #[serde(default = "default_flat_input_types")]
    pub flat_input_types: Vec<String>,
    /// Templates JSON file; `~` is expanded
    #[serde(default = "default_templates_path")]
    pub templates_path: String,
}

fn default_trigger_key() -> String {
    DEFAULT_TRIGGER_KEY.to_string()
}
fn default_lookback_chars() -> usize {
    DEFAULT_LOOKBACK_CHARS
}
fn default_flat_input_types() -> Vec<String> {
    DEFAULT_FLAT_INPUT_TYPES
        .iter()
        .map(|t| t.to_string())
        .collect()
}
fn default_templates_path() -> String {
    DEFAULT_TEMPLATES_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trigger_key: default_trigger_key(),
            lookback_chars: default_lookback_chars(),
            flat_input_types: default_flat_input_types(),
            templates_path: default_templates_path(),
        }
    }
}

impl Config {
    /// Templates path with `~` expanded
    pub fn templates_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.templates_path).as_ref())
    }

    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    /// - `Config`: empty trigger key or a zero lookback window
    pub fn validate(&self) -> Result<()> {
        if self.trigger_key.is_empty() {
            return Err(ExpandError::Config("triggerKey must not be empty".to_string()));
        }
        if self.lookback_chars == 0 {
            return Err(ExpandError::Config(
                "lookbackChars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Keystroke settings for `ExpansionEngine`
    pub fn expansion_settings(&self) -> ExpansionSettings {
        ExpansionSettings {
            trigger_key: self.trigger_key.clone(),
            lookback: self.lookback_chars,
            flat_input_types: self
                .flat_input_types
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }
}
