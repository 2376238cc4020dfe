pub mod alert;

pub use alert::{Alert, AlertLog, AlertSeverity};

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Modified,
    Created,
    Deleted,
}

/// A single filesystem change reported by a watcher. Consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub is_directory: bool,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileEventKind::Modified, false)
    }

    /// Final path component for alert text, or the full path when there is none.
    pub fn display_name(&self) -> String {
        file_name(&self.path)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Anything that accepts filesystem events: the detection engine itself, or the
/// channel that feeds the monitor's dispatcher thread.
pub trait FileEventHandler: Send {
    fn handle_event(&mut self, event: FileEvent);
}

impl FileEventHandler for Sender<FileEvent> {
    fn handle_event(&mut self, event: FileEvent) {
        if self.send(event).is_err() {
            log::debug!("Event channel closed, dropping filesystem event");
        }
    }
}
