use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::trace::trace::EditEvent;

/// Appends editor events to a JSONL file, one object per line.
///
/// A file that cannot be opened or written turns the logger off; editing
/// carries on without it.
pub struct TraceLogger {
    path: PathBuf,
    file: RefCell<Option<File>>,
    written: Cell<usize>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| warn!("Edit trace disabled, cannot open {}: {}", path.display(), e))
            .ok();

        TraceLogger {
            path,
            file: RefCell::new(file),
            written: Cell::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.file.borrow().is_some()
    }

    /// Events written so far.
    pub fn written(&self) -> usize {
        self.written.get()
    }

    pub fn log(&self, event: &EditEvent) {
        let mut slot = self.file.borrow_mut();
        let Some(file) = slot.as_mut() else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!("Skipping {} event: {}", event.kind, e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", line) {
            warn!("Edit trace disabled after write error on {}: {}", self.path.display(), e);
            *slot = None;
            return;
        }
        self.written.set(self.written.get() + 1);
    }
}
