use notify::{
    recommended_watcher, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher,
};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Quiet period before a burst of file events becomes one reload
const DEBOUNCE_MS: u64 = 500;

/// How often the event loop checks for shutdown while idle
const POLL_INTERVAL_MS: u64 = 100;

/// Event emitted when the templates file needs to be re-read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateReloadEvent {
    Reload,
}

/// Watches the templates JSON file and emits reload events
///
/// The parent directory is watched non-recursively so that editors which
/// replace the file (write to temp + rename) are still observed.
///
/// Dropping the watcher stops the OS watch, joins the event thread and,
/// once any pending debounce has lapsed, closes the reload channel. No
/// reload is emitted after the drop.
pub struct TemplateWatcher {
    path: PathBuf,
    tx: Option<Sender<TemplateReloadEvent>>,
    watcher: Option<RecommendedWatcher>,
    stopped: Arc<AtomicBool>,
    watcher_thread: Option<thread::JoinHandle<()>>,
}

impl TemplateWatcher {
    /// Create a new TemplateWatcher for `path`
    ///
    /// Returns a tuple of (watcher, receiver) where receiver will emit
    /// `TemplateReloadEvent` when the file changes.
    pub fn new(path: impl Into<PathBuf>) -> (Self, Receiver<TemplateReloadEvent>) {
        let (tx, rx) = channel();
        let watcher = TemplateWatcher {
            path: path.into(),
            tx: Some(tx),
            watcher: None,
            stopped: Arc::new(AtomicBool::new(false)),
            watcher_thread: None,
        };
        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        self.watcher_thread.is_some()
    }

    /// Start watching the templates file for changes
    ///
    /// The OS watch is registered before this returns, so a write made
    /// right afterwards is observed. Events are debounced on a background
    /// thread that lives until the watcher is dropped.
    pub fn start(&mut self) -> NotifyResult<()> {
        if self.tx.is_none() {
            return Err(std::io::Error::other("watcher already started").into());
        }

        let watch_dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let Some(file_name) = self.path.file_name().map(|n| n.to_os_string()) else {
            return Err(notify::Error::generic("templates path has no file name"));
        };

        let (watch_tx, watch_rx) = channel();
        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = watch_tx.send(res);
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        info!(
            path = %watch_dir.display(),
            target = %self.path.display(),
            "Template watcher started"
        );

        let Some(tx) = self.tx.take() else {
            return Err(std::io::Error::other("watcher already started").into());
        };
        let path = self.path.clone();
        let stopped = Arc::clone(&self.stopped);
        let thread_handle = thread::spawn(move || {
            Self::event_loop(path, file_name, watch_rx, tx, stopped);
        });

        self.watcher = Some(watcher);
        self.watcher_thread = Some(thread_handle);
        Ok(())
    }

    fn event_loop(
        path: PathBuf,
        file_name: OsString,
        watch_rx: Receiver<notify::Result<notify::Event>>,
        tx: Sender<TemplateReloadEvent>,
        stopped: Arc<AtomicBool>,
    ) {
        let debounce_active = Arc::new(Mutex::new(false));

        loop {
            if stopped.load(Ordering::SeqCst) {
                break;
            }
            match watch_rx.recv_timeout(Duration::from_millis(POLL_INTERVAL_MS)) {
                Ok(Ok(event)) => {
                    if !is_relevant_event(&event, &file_name) {
                        continue;
                    }

                    let mut debounce = debounce_active.lock();
                    if *debounce {
                        continue;
                    }
                    *debounce = true;
                    drop(debounce);

                    let tx_clone = tx.clone();
                    let debounce_flag = Arc::clone(&debounce_active);
                    let stopped = Arc::clone(&stopped);
                    let target = path.clone();
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(DEBOUNCE_MS));
                        *debounce_flag.lock() = false;
                        if stopped.load(Ordering::SeqCst) {
                            return;
                        }
                        if tx_clone.send(TemplateReloadEvent::Reload).is_ok() {
                            info!(
                                file = %target.display(),
                                "Templates file changed, emitting reload event"
                            );
                        }
                    });
                }
                Ok(Err(e)) => {
                    warn!(error = %e, watcher = "templates", "File watcher error");
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!(watcher = "templates", "Template watcher shutting down");
    }
}

impl Drop for TemplateWatcher {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        // Dropping the notify watcher releases the OS watch.
        self.watcher.take();
        if let Some(handle) = self.watcher_thread.take() {
            if handle.join().is_err() {
                debug!(watcher = "templates", "Template watcher thread panicked");
            }
        }
    }
}

/// Whether a raw notify event touches `file_name` in a way that changes
/// its contents (create, modify, remove).
pub fn is_relevant_event(event: &notify::Event, file_name: &OsString) -> bool {
    let touches_file = event
        .paths
        .iter()
        .any(|p| p.file_name().map(|n| n == file_name).unwrap_or(false));

    let changes_contents = matches!(
        event.kind,
        notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
    );

    touches_file && changes_contents
}
