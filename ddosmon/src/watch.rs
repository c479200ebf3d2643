//! Directory watcher for result files
//!
//! Wraps an OS filesystem watch on the detector's output directory and
//! forwards create/modify notifications for matching filenames into a
//! channel the ingestion coordinator consumes. The notify callback runs on
//! the watcher's own thread and only filters and does a non-blocking send,
//! so slow downstream processing never backs up into the OS watch.

use std::path::{Path, PathBuf};

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;

/// Filename filter for result files: fixed prefix and suffix.
#[derive(Debug, Clone)]
pub struct FilePattern {
    prefix: String,
    suffix: String,
}

impl FilePattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Whether the filename component of `path` matches the pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.starts_with(&self.prefix) && name.ends_with(&self.suffix))
            .unwrap_or(false)
    }
}

/// Active watch on the output directory.
///
/// The OS watch handle lives as long as this struct; dropping it tears the
/// watch down and ends the event stream. The stream is not restartable —
/// resuming means spawning a fresh watcher.
pub struct DirWatcher {
    _watcher: RecommendedWatcher,
}

impl DirWatcher {
    /// Establish a watch on `dir`, returning the watcher handle and the
    /// lazy, unbounded stream of matching paths.
    ///
    /// Failure here (directory missing, watch descriptor exhaustion) is
    /// fatal to startup: the entire pipeline hangs off this watch.
    pub fn spawn(
        dir: &Path,
        pattern: FilePattern,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PathBuf>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    // Modify covers in-place writes and renames; anything
                    // else (access, metadata) is noise for ingestion.
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        return;
                    }
                    for path in event.paths {
                        if pattern.matches(&path) {
                            debug!("Result file event: {}", path.display());
                            // A closed receiver means shutdown is underway.
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!("Filesystem watch error: {}", e),
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok((Self { _watcher: watcher }, rx))
    }
}
