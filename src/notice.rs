//! Toast notifications.
//!
//! Controllers push notices here instead of printing; the CLI drains and
//! prints them, the terminal console shows the latest one in its footer.
//! A keyed notice replaces any earlier notice with the same key.

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub content: String,
    pub key: Option<String>,
    pub at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct Notices {
    queue: Vec<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NoticeLevel, content: impl Into<String>, key: Option<&str>) {
        let notice = Notice {
            level,
            content: content.into(),
            key: key.map(str::to_string),
            at: Local::now(),
        };
        if let Some(key) = &notice.key {
            self.queue.retain(|n| n.key.as_ref() != Some(key));
        }
        self.queue.push(notice);
    }

    pub fn success(&mut self, content: impl Into<String>) {
        self.push(NoticeLevel::Success, content, None);
    }

    pub fn warning(&mut self, content: impl Into<String>) {
        self.push(NoticeLevel::Warning, content, None);
    }

    pub fn error(&mut self, content: impl Into<String>) {
        self.push(NoticeLevel::Error, content, None);
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.queue.last()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.queue)
    }
}
