//! Template store adapters
//!
//! The engine only needs `get()` once at startup and `on_change` afterwards.
//! `MemoryTemplateStore` serves tests and embedders that own their data;
//! `FileTemplateStore` reads a `{"templates": {...}}` JSON file and
//! re-reads it when the file changes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{is_valid_keyword, TemplateMap};
use crate::error::{ExpandError, Result};
use crate::logging;
use crate::watcher::TemplateWatcher;

/// Callback invoked with the full new snapshot after every change
pub type ChangeCallback = Box<dyn Fn(&TemplateMap) + Send + Sync>;

/// Source of templates for the expansion engine
pub trait TemplateStore {
    /// Current snapshot.
    fn get(&self) -> Result<TemplateMap>;

    /// Register `callback` to receive every later snapshot.
    fn on_change(&self, callback: ChangeCallback);
}

#[derive(Default)]
struct Subscribers {
    callbacks: Mutex<Vec<ChangeCallback>>,
}

impl Subscribers {
    fn push(&self, callback: ChangeCallback) {
        self.callbacks.lock().push(callback);
    }

    fn notify(&self, snapshot: &TemplateMap) {
        let callbacks = self.callbacks.lock();
        debug!(
            subscribers = callbacks.len(),
            templates = snapshot.len(),
            "Notifying template subscribers"
        );
        for callback in callbacks.iter() {
            callback(snapshot);
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process template store
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: Mutex<TemplateMap>,
    subscribers: Subscribers,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: TemplateMap) -> Self {
        Self {
            templates: Mutex::new(templates),
            subscribers: Subscribers::default(),
        }
    }

    /// Insert or overwrite a template, then notify subscribers.
    ///
    /// # Errors
    /// - `InvalidKeyword`: `keyword` is empty or contains characters outside
    ///   `[A-Za-z0-9_-]`
    pub fn set(&self, keyword: &str, body: &str) -> Result<()> {
        if !is_valid_keyword(keyword) {
            return Err(ExpandError::InvalidKeyword(keyword.to_string()));
        }
        let snapshot = {
            let mut templates = self.templates.lock();
            templates.insert(keyword.to_string(), body.to_string());
            templates.clone()
        };
        self.subscribers.notify(&snapshot);
        Ok(())
    }

    /// Remove a template. Returns whether it existed; subscribers are only
    /// notified when something changed.
    pub fn remove(&self, keyword: &str) -> bool {
        let snapshot = {
            let mut templates = self.templates.lock();
            if templates.remove(keyword).is_none() {
                return false;
            }
            templates.clone()
        };
        self.subscribers.notify(&snapshot);
        true
    }

    pub fn clear(&self) {
        self.templates.lock().clear();
        self.subscribers.notify(&TemplateMap::new());
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn get(&self) -> Result<TemplateMap> {
        Ok(self.templates.lock().clone())
    }

    fn on_change(&self, callback: ChangeCallback) {
        self.subscribers.push(callback);
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// On-disk shape: `{"templates": {"sig": "Best regards"}}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: TemplateMap,
}

/// Template store backed by a JSON file
pub struct FileTemplateStore {
    path: PathBuf,
    subscribers: Arc<Subscribers>,
    watcher: Option<TemplateWatcher>,
}

impl FileTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscribers: Arc::new(Subscribers::default()),
            watcher: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching the file; every debounced change re-reads it and
    /// notifies subscribers. Calling this twice is a no-op.
    ///
    /// Dropping the store stops the watch and ends the reload thread;
    /// subscribers are not called after that.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            debug!("Template file already watched");
            return Ok(());
        }

        let (mut watcher, rx) = TemplateWatcher::new(self.path.clone());
        watcher.start()?;

        let path = self.path.clone();
        let subscribers: Weak<Subscribers> = Arc::downgrade(&self.subscribers);
        thread::spawn(move || {
            for _event in rx {
                let Some(subscribers) = subscribers.upgrade() else {
                    break;
                };
                match read_templates(&path) {
                    Ok(snapshot) => {
                        logging::log_templates_loaded(&path.display().to_string(), snapshot.len());
                        subscribers.notify(&snapshot);
                    }
                    Err(e) => logging::log_error(
                        "TEMPLATES",
                        &e.to_string(),
                        Some("reload after file change; keeping previous templates"),
                    ),
                }
            }
            debug!(path = %path.display(), "Template reload thread finished");
        });

        self.watcher = Some(watcher);
        Ok(())
    }
}

impl TemplateStore for FileTemplateStore {
    fn get(&self) -> Result<TemplateMap> {
        read_templates(&self.path)
    }

    fn on_change(&self, callback: ChangeCallback) {
        self.subscribers.push(callback);
    }
}

/// Read a templates file. A missing file is an empty map; entries whose
/// keyword is invalid are dropped with a warning.
pub(crate) fn read_templates(path: &Path) -> Result<TemplateMap> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Templates file not found, using empty map");
            return Ok(TemplateMap::new());
        }
        Err(source) => {
            return Err(ExpandError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if raw.trim().is_empty() {
        return Ok(TemplateMap::new());
    }

    let file: TemplateFile = serde_json::from_str(&raw).map_err(|source| ExpandError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut templates = file.templates;
    templates.retain(|keyword, _| {
        let valid = is_valid_keyword(keyword);
        if !valid {
            warn!(keyword = %keyword, path = %path.display(), "Skipping template with invalid keyword");
        }
        valid
    });
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Poll `condition` until it holds or `timeout` passes.
    fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(50));
        }
        condition()
    }

    fn counting_callback(counter: &Arc<AtomicUsize>) -> ChangeCallback {
        let counter = Arc::clone(counter);
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_memory_store_set_notifies_with_full_snapshot() {
        let store = MemoryTemplateStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        store.on_change(Box::new(move |snapshot| {
            seen_clone.lock().push(snapshot.clone());
        }));

        store.set("sig", "Regards").expect("valid keyword");
        store.set("addr", "1 Main St").expect("valid keyword");

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].len(), 2);
        assert_eq!(seen[1].get("sig").map(String::as_str), Some("Regards"));
    }

    #[test]
    fn test_memory_store_rejects_invalid_keyword() {
        let store = MemoryTemplateStore::new();
        let counter = Arc::new(AtomicUsize::new(0));
        store.on_change(counting_callback(&counter));

        let err = store.set("no spaces", "x").unwrap_err();
        assert!(matches!(err, ExpandError::InvalidKeyword(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(store.get().expect("memory get").is_empty());
    }

    #[test]
    fn test_memory_store_remove_missing_does_not_notify() {
        let store = MemoryTemplateStore::new();
        let counter = Arc::new(AtomicUsize::new(0));
        store.on_change(counting_callback(&counter));

        assert!(!store.remove("ghost"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        store.set("sig", "x").expect("valid keyword");
        assert!(store.remove("sig"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_memory_store_clear() {
        let mut templates = TemplateMap::new();
        templates.insert("sig".to_string(), "x".to_string());
        let store = MemoryTemplateStore::with_templates(templates);
        store.clear();
        assert!(store.get().expect("memory get").is_empty());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTemplateStore::new(dir.path().join("templates.json"));
        assert!(store.get().expect("missing file is not an error").is_empty());
    }

    #[test]
    fn test_file_store_reads_templates_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        fs::write(
            &path,
            r#"{"templates": {"sig": "Best regards,\nAlex", "bad key": "x"}}"#,
        )
        .expect("write templates");

        let templates = FileTemplateStore::new(&path).get().expect("valid file");
        assert_eq!(templates.len(), 1);
        assert_eq!(
            templates.get("sig").map(String::as_str),
            Some("Best regards,\nAlex")
        );
    }

    #[test]
    fn test_file_store_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        fs::write(&path, "{ not json").expect("write templates");

        let err = FileTemplateStore::new(&path).get().unwrap_err();
        assert!(matches!(err, ExpandError::Parse { .. }));
    }

    #[test]
    fn test_file_store_missing_templates_key_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        fs::write(&path, "{}").expect("write templates");
        assert!(FileTemplateStore::new(&path).get().expect("valid file").is_empty());
    }

    #[test]
    fn test_watch_reloads_and_notifies_subscribers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        fs::write(&path, r#"{"templates": {"sig": "old"}}"#).expect("write templates");

        let mut store = FileTemplateStore::new(&path);
        let seen = Arc::new(Mutex::new(Vec::<TemplateMap>::new()));
        let seen_clone = Arc::clone(&seen);
        store.on_change(Box::new(move |snapshot| {
            seen_clone.lock().push(snapshot.clone());
        }));
        store.watch().expect("watch templates");

        fs::write(&path, r#"{"templates": {"sig": "new", "addr": "1 Main St"}}"#)
            .expect("rewrite templates");

        assert!(wait_until(Duration::from_secs(5), || {
            seen.lock()
                .last()
                .is_some_and(|snapshot| snapshot.get("sig").map(String::as_str) == Some("new"))
        }));
        assert_eq!(seen.lock().last().map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_watch_keeps_previous_snapshot_on_malformed_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        fs::write(&path, r#"{"templates": {"sig": "x"}}"#).expect("write templates");

        let mut store = FileTemplateStore::new(&path);
        let counter = Arc::new(AtomicUsize::new(0));
        store.on_change(counting_callback(&counter));
        store.watch().expect("watch templates");

        fs::write(&path, "{ broken").expect("write malformed templates");
        thread::sleep(Duration::from_millis(1500));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropped_store_stops_notifying() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("templates.json");
        fs::write(&path, "{}").expect("write templates");

        let mut store = FileTemplateStore::new(&path);
        let counter = Arc::new(AtomicUsize::new(0));
        store.on_change(counting_callback(&counter));
        store.watch().expect("watch templates");

        fs::write(&path, r#"{"templates": {"a": "1"}}"#).expect("rewrite templates");
        assert!(wait_until(Duration::from_secs(5), || {
            counter.load(Ordering::SeqCst) >= 1
        }));

        // Let any trailing debounce settle before dropping.
        thread::sleep(Duration::from_millis(800));
        let before_drop = counter.load(Ordering::SeqCst);
        drop(store);

        fs::write(&path, r#"{"templates": {"b": "2"}}"#).expect("rewrite after drop");
        thread::sleep(Duration::from_millis(1500));
        assert_eq!(counter.load(Ordering::SeqCst), before_drop);
    }

    #[test]
    fn test_watch_twice_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileTemplateStore::new(dir.path().join("templates.json"));
        store.watch().expect("first watch");
        store.watch().expect("second watch is a no-op");
    }
}
