use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

/// Error severity, used to pick a log level when an error is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

/// Domain-specific errors for hash-expand
///
/// None of these are produced per keystroke. Keystroke handling reports
/// skips and aborts through `ExpansionOutcome`; these cover the ambient
/// surfaces (config, template store, file watching).
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid template keyword '{0}': use letters, numbers, underscore or hyphen only")]
    InvalidKeyword(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File watch error: {0}")]
    FileWatch(#[from] notify::Error),
}

impl ExpandError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } => ErrorSeverity::Error,
            Self::Parse { .. } => ErrorSeverity::Warning,
            Self::InvalidKeyword(_) => ErrorSeverity::Info,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::FileWatch(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Io { path, .. } => format!("Could not read {}", path.display()),
            Self::Parse { path, .. } => format!("Invalid JSON in {}", path.display()),
            Self::InvalidKeyword(keyword) => format!(
                "Keyword '{}' is not allowed. Use letters, numbers, underscore or hyphen only (no spaces).",
                keyword
            ),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::FileWatch(e) => format!("File watcher issue: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpandError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use hash_expand::error::ResultExt;
///
/// let snapshot = store.get().warn_on_err().unwrap_or_default();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

/// Panic in debug mode, log error in release mode.
///
/// Use for "impossible" states that should crash during development
/// but gracefully degrade in production.
///
/// ```ignore
/// if !commit_flat_edit(doc, control, &edit) {
///     debug_panic!("flat surface {:?} lost its control state", control);
///     return ExpansionOutcome::Aborted;
/// }
/// ```
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}
