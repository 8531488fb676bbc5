use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Success => write!(f, "success"),
            NoticeKind::Error => write!(f, "error"),
            NoticeKind::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// In-page notification queue. Clones share the same queue, so the editor
/// and the site can both post to it.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Rc<RefCell<VecDeque<Notice>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeKind::Info, message.into());
    }

    fn push(&self, kind: NoticeKind, message: String) {
        match kind {
            NoticeKind::Error => error!("{}", message),
            _ => info!("[{}] {}", kind, message),
        }
        self.queue.borrow_mut().push_back(Notice { kind, message });
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> Vec<Notice> {
        self.queue.borrow().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.queue.borrow().back().cloned()
    }
}
