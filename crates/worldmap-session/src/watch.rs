//! File system notifications for a game directory.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{DebounceEventResult, Debouncer, FileIdMap, new_debouncer};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::SessionError;

/// Coalescing window of the OS-level debouncer. The session applies its own
/// quiet period on top.
const EVENT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches a game directory recursively and forwards every created,
/// modified or removed file as a path relative to the directory, with `/`
/// separators. Dropping the watcher stops it.
pub struct FsWatcher {
    _debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
    root: PathBuf,
}

impl FsWatcher {
    pub fn spawn(root: &Path, tx: UnboundedSender<String>) -> Result<Self, SessionError> {
        let root = root.canonicalize().map_err(|e| SessionError::Watch {
            detail: format!("{}: {e}", root.display()),
        })?;

        let event_root = root.clone();
        let mut debouncer = new_debouncer(
            EVENT_DEBOUNCE,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        if !matches!(
                            event.event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) {
                            continue;
                        }
                        for path in &event.event.paths {
                            let Some(relative) = relative_path(&event_root, path) else {
                                continue;
                            };
                            if tx.send(relative).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(%error, "file watcher error");
                    }
                }
            },
        )
        .map_err(|e| SessionError::Watch {
            detail: e.to_string(),
        })?;

        debouncer
            .watcher()
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| SessionError::Watch {
                detail: e.to_string(),
            })?;

        tracing::info!(root = %root.display(), "watching game directory");
        Ok(Self {
            _debouncer: debouncer,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// `path` relative to `root` with `/` separators, or `None` when it lies
/// outside `root` or is not valid UTF-8.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
