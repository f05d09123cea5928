use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient status line shown under the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub shown_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.shown_at >= ttl
    }
}
