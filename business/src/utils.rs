use chrono::{DateTime, TimeDelta, Utc};
use url::Url;

/// Content previews longer than this are truncated.
pub const PREVIEW_MAX_CHARS: usize = 120;

/// Trailing-edge debounce driven by an external clock.
///
/// Each `trigger` pushes the deadline back; `fire` returns `true` once, after
/// the quiet period has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    wait: TimeDelta,
    deadline: Option<DateTime<Utc>>,
}

impl Debounce {
    pub fn new(wait: TimeDelta) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    pub fn trigger(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.wait);
    }

    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Whether `text` parses as an absolute URL.
pub fn is_valid_url(text: &str) -> bool {
    Url::parse(text.trim()).is_ok()
}

/// `"{prefix}_{millis}.{ext}"`, unique per millisecond.
pub fn unique_filename(prefix: &str, ext: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}_{}.{ext}", now.timestamp_millis())
}

/// Short, single-line rendering of the encoded content.
pub fn preview_text(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "(empty)".to_owned();
    }
    if text.chars().count() <= PREVIEW_MAX_CHARS {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(PREVIEW_MAX_CHARS - 3).collect();
    short.push('…');
    short
}
