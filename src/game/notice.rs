//! Transient user-facing notifications.

use std::time::Duration;

use tokio::time::Instant;

use crate::game::rules::NOTICE_TTL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Gain,
    Loss,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    expires_at: Option<Instant>,
}

/// Holds at most one notice. Posting always replaces the current notice along
/// with its pending expiry.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notice>,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NOTICE_TTL)
    }
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    /// Shows a notice that clears itself after the configured lifetime.
    pub fn post(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        self.replace(kind, text.into(), Some(now + self.ttl));
    }

    /// Shows a notice that stays until something else replaces it.
    pub fn post_sticky(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.replace(kind, text.into(), None);
    }

    fn replace(&mut self, kind: NoticeKind, text: String, expires_at: Option<Instant>) {
        tracing::debug!(?kind, %text, "notice");
        self.current = Some(Notice { kind, text, expires_at });
    }

    /// Clears the notice if its lifetime has run out. Returns whether it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(at) if at <= now => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().and_then(|n| n.expires_at)
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|n| n.text.as_str())
    }
}

/// `15000` → `15K`, `-3000` → `-3K`; values that are not whole thousands are
/// printed as they are.
pub fn format_points(value: i64) -> String {
    if value % 1000 == 0 {
        format!("{}K", value / 1000)
    } else {
        value.to_string()
    }
}
