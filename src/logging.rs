//! Structured JSONL logging plus human-readable stderr output.
//!
//! - **JSONL to file** (`~/.hash-expand/logs/hash-expand.jsonl`), one JSON
//!   object per line
//! - **Compact to stderr** for whoever is running the binary
//!
//! # Usage
//!
//! ```rust,ignore
//! use hash_expand::logging;
//!
//! // Keep the guard alive for the duration of the program
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "app_start", "Started");
//! ```
//!
//! # JSONL Output Format
//!
//! ```json
//! {"timestamp":"2026-10-19T10:30:45.123Z","level":"INFO","target":"hash_expand::logging","fields":{"event_type":"expansion","token":"sig","surface":"flat","caret_offset":25,"message":"Expanded #sig"}}
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "hash-expand.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize dual-output logging.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
/// If the log file cannot be opened, file output is discarded and stderr
/// logging still works.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    let file_writer: Box<dyn Write + Send> = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => Box::new(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            Box::new(std::io::sink())
        }
    };

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_writer);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(stderr_layer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// `~/.hash-expand/logs/`, or a temp dir when there is no home directory
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".hash-expand").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("hash-expand-logs"))
}

/// Path of the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

// =============================================================================
// STRUCTURED LOGGING HELPERS
// =============================================================================

/// Log a completed expansion
pub fn log_expansion_event(token: &str, surface: &str, caret_offset: usize) {
    tracing::info!(
        event_type = "expansion",
        token = token,
        surface = surface,
        caret_offset = caret_offset,
        "Expanded #{}", token
    );
}

/// Log a template store reload
pub fn log_templates_loaded(source: &str, count: usize) {
    tracing::info!(
        event_type = "templates_loaded",
        source = source,
        count = count,
        "Loaded {} templates from {}", count, source
    );
}

/// Log an error with structured fields and context
pub fn log_error(category: &str, error: &str, context: Option<&str>) {
    let msg = match context {
        Some(ctx) => format!("{}: {} (context: {})", category, error, ctx),
        None => format!("{}: {}", category, error),
    };

    tracing::error!(
        event_type = "error",
        category = category,
        error_message = error,
        context = context,
        "{}", msg
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_jsonl_under_logs_dir() {
        let path = log_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(LOG_FILE_NAME));
        let dir = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        assert!(dir == "logs" || dir == "hash-expand-logs", "unexpected log dir {dir}");
    }

    #[test]
    fn test_helpers_do_not_require_a_subscriber() {
        log_expansion_event("sig", "flat", 25);
        log_templates_loaded("memory", 0);
        log_error("CONFIG", "bad json", Some("config.json"));
        log_error("CONFIG", "bad json", None);
    }
}
