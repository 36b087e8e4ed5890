//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

pub use crate::expand::{DEFAULT_FLAT_INPUT_TYPES, DEFAULT_TRIGGER_KEY};

/// Default number of chars inspected before the caret
pub const DEFAULT_LOOKBACK_CHARS: usize = crate::expand::DEFAULT_LOOKBACK;

/// Default templates file (`~` is expanded when the path is used)
pub const DEFAULT_TEMPLATES_PATH: &str = "~/.hash-expand/templates.json";

/// Location of the user config file
pub const CONFIG_PATH: &str = "~/.hash-expand/config.json";
