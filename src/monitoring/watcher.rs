//! Filesystem subscription

use crate::error::MonitorError;
use crate::events::{FileEvent, FileEventHandler, FileEventKind};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Source of filesystem events for a monitored tree.
pub trait FileWatcher: Send {
    /// Subscribes to changes under `root`, delivering each one to `handler` from
    /// the watcher's own thread.
    fn watch(
        &mut self,
        root: &Path,
        recursive: bool,
        handler: Box<dyn FileEventHandler>,
    ) -> Result<(), MonitorError>;

    /// Cancels the subscription and releases the OS watch handle. No-op when idle.
    fn unwatch(&mut self);
}

/// Native watcher (inotify, FSEvents, ReadDirectoryChangesW) via `notify`.
#[derive(Default)]
pub struct NotifyWatcher {
    active: Option<(RecommendedWatcher, PathBuf)>,
}

impl NotifyWatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileWatcher for NotifyWatcher {
    fn watch(
        &mut self,
        root: &Path,
        recursive: bool,
        mut handler: Box<dyn FileEventHandler>,
    ) -> Result<(), MonitorError> {
        if let Some((_, current)) = &self.active {
            return Err(MonitorError::AlreadyActive(current.clone()));
        }

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for file_event in translate(&event) {
                        handler.handle_event(file_event);
                    }
                }
                Err(e) => log::warn!("Filesystem watcher error: {}", e),
            },
            Config::default(),
        )?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(root, mode)?;

        log::debug!("Watching {} ({:?})", root.display(), mode);
        self.active = Some((watcher, root.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self) {
        if let Some((mut watcher, root)) = self.active.take() {
            if let Err(e) = watcher.unwatch(&root) {
                log::debug!("Unwatch of {} failed: {}", root.display(), e);
            }
            // Dropping the watcher stops its event thread.
            drop(watcher);
            log::debug!("Stopped watching {}", root.display());
        }
    }
}

impl Drop for NotifyWatcher {
    fn drop(&mut self) {
        self.unwatch();
    }
}

/// Maps a `notify` event onto zero or more [`FileEvent`]s.
///
/// Renames report the destination as modified, since that is where ransomware
/// leaves its marker extension. Access and unclassified events are dropped.
pub fn translate(event: &Event) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FileEventKind::Created,
        EventKind::Remove(_) => FileEventKind::Deleted,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FileEventKind::Deleted,
        EventKind::Modify(_) => FileEventKind::Modified,
        _ => return Vec::new(),
    };

    let paths = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            &event.paths[event.paths.len().saturating_sub(1)..]
        }
        _ => &event.paths[..],
    };

    paths
        .iter()
        .map(|path| {
            let is_directory = match event.kind {
                EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
                    true
                }
                EventKind::Remove(_) => false,
                _ => path.is_dir(),
            };
            FileEvent::new(path.clone(), kind, is_directory)
        })
        .collect()
}
