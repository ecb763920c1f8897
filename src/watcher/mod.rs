//! File watching for external edits.
//!
//! Uses notify for cross-platform file system events. The watcher only
//! reports that the file changed; coalescing bursts of changes is left to the
//! marker coordinator's debouncer, which already handles typing.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::warn;

/// Watches a single file.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
}

impl FileWatcher {
    /// Create a watcher for `path`.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>) -> notify::Result<Self> {
        // OS event paths are canonical; match them against a canonical target.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        // Editors often save by rename, so watch the directory, not the file.
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Drain queued events; true if any of them concern the watched file.
    pub fn take_change(&self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            changed |= self.record(event);
        }
        changed
    }

    /// Like [`take_change`](Self::take_change), but wait up to `timeout` for
    /// the first event.
    pub fn wait_change(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                let first = self.record(event);
                self.take_change() || first
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                warn!(path = %self.target_path.display(), "file watcher disconnected");
                false
            }
        }
    }

    fn record(&self, event: notify::Result<Event>) -> bool {
        match event {
            Ok(ev) if self.is_relevant(&ev) => {
                crate::perf::log_event("watcher.change", format!("kind={:?}", ev.kind));
                true
            }
            Ok(ev) => {
                crate::perf::log_event(
                    "watcher.irrelevant",
                    format!("kind={:?} paths={:?}", ev.kind, ev.paths),
                );
                false
            }
            Err(err) => {
                warn!(%err, "file watcher error");
                crate::perf::log_event("watcher.error", format!("{err}"));
                false
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
