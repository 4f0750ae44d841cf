//! Timed notices
//!
//! Success and error banners that clear themselves after a fixed delay,
//! whatever the user does in the meantime.

use crate::config::UiConfig;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    pub fn is_active_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// At most one success and one error notice at a time
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    success: Option<Notice>,
    error: Option<Notice>,
    success_ttl: Duration,
    error_ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl NoticeBoard {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            success: None,
            error: None,
            success_ttl: Duration::from_millis(config.success_notice_ms),
            error_ttl: Duration::from_millis(config.error_notice_ms),
        }
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&mut self, message: impl Into<String>) {
        self.success = Some(Notice {
            kind: NoticeKind::Success,
            message: message.into(),
            expires_at: Instant::now() + self.success_ttl,
        });
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(Notice {
            kind: NoticeKind::Error,
            message: message.into(),
            expires_at: Instant::now() + self.error_ttl,
        });
    }

    /// Notices still visible at `now`
    pub fn active_at(&self, now: Instant) -> Vec<&Notice> {
        [&self.success, &self.error]
            .into_iter()
            .flatten()
            .filter(|n| n.is_active_at(now))
            .collect()
    }

    /// Notices visible right now
    pub fn current(&self) -> Vec<&Notice> {
        self.active_at(Instant::now())
    }

    pub fn success(&self) -> Option<&str> {
        self.success
            .as_ref()
            .filter(|n| n.is_active_at(Instant::now()))
            .map(|n| n.message.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|n| n.is_active_at(Instant::now()))
            .map(|n| n.message.as_str())
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
