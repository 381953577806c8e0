use chrono::{DateTime, Utc};
use serde::Serialize;

/// A closed time interval. Both endpoints belong to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        self.start <= *t && *t <= self.end
    }

    /// True when `other` lies entirely inside this window.
    pub fn encloses(&self, other: &TimeWindow) -> bool {
        self.contains(&other.start) && self.contains(&other.end)
    }
}
