//! Configuration module - expansion settings and file locations
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.hash-expand/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - `Config` and its conversion into `ExpansionSettings`
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    CONFIG_PATH, DEFAULT_FLAT_INPUT_TYPES, DEFAULT_LOOKBACK_CHARS, DEFAULT_TEMPLATES_PATH,
    DEFAULT_TRIGGER_KEY,
};

pub use types::Config;

pub use loader::{load_config, load_config_at, load_config_from};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
