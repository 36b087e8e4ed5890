//! hash-expand - `#token` text expansion for editable surfaces
//!
//! Watches key presses on a host document and, when the trigger key
//! follows `#token` with a known template, replaces the token with the
//! template body. Both flat form controls (`INPUT` / `TEXTAREA`) and
//! content-editable regions are supported.

pub mod config;
pub mod dom;
pub mod error;
pub mod expand;
pub mod logging;
pub mod simulate;
pub mod templates;
pub mod utils;
pub mod watcher;
