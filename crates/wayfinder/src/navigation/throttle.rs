//! Rate limiting for spoken distance reminders.

use chrono::{DateTime, Duration, Utc};

/// Default minimum gap between distance reminders.
pub const DEFAULT_ANNOUNCE_INTERVAL_SECS: i64 = 10;

/// Enforces a minimum gap between distance-reminder announcements.
///
/// Step-change announcements are not gated, but the session still records
/// them here so the next reminder waits a full interval after them.
#[derive(Debug, Clone)]
pub struct AnnouncementThrottle {
    interval: Duration,
    last: Option<DateTime<Utc>>,
}

impl Default for AnnouncementThrottle {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_ANNOUNCE_INTERVAL_SECS))
    }
}

impl AnnouncementThrottle {
    /// Create a throttle with the given gap.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The configured gap.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the last announcement was recorded.
    #[must_use]
    pub fn last_announcement(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Whether a reminder may be spoken at `now`.
    #[must_use]
    pub fn should_announce(&self, now: DateTime<Utc>) -> bool {
        self.last.map_or(true, |last| now - last >= self.interval)
    }

    /// Record that an announcement was made at `now`.
    pub fn record_announcement(&mut self, now: DateTime<Utc>) {
        self.last = Some(now);
    }

    /// Forget the last announcement.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
