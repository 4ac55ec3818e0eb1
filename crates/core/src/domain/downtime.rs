// Downtime Log Domain Model

use serde::{Deserialize, Serialize};

/// Reason recorded when the operator leaves the description blank
pub const DEFAULT_DOWNTIME_REASON: &str = "No description provided.";

/// A closed downtime period, recorded as observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowntimeInterval {
    pub down_at: i64,
    pub up_at: i64,
    pub description: String,
}

impl DowntimeInterval {
    /// Length of the interval in ms, clamped to zero against clock skew
    pub fn duration_ms(&self) -> i64 {
        (self.up_at - self.down_at).max(0)
    }
}

/// A downtime period with a recorded start but no end yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDowntime {
    pub down_at: i64,
    pub description: String,
}

impl OpenDowntime {
    pub fn new(down_at: i64, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let description = if reason.trim().is_empty() {
            DEFAULT_DOWNTIME_REASON.to_string()
        } else {
            reason
        };
        Self {
            down_at,
            description,
        }
    }

    /// Close at `up_at` without consuming the open interval
    pub fn closed_at(&self, up_at: i64) -> DowntimeInterval {
        DowntimeInterval {
            down_at: self.down_at,
            up_at,
            description: self.description.clone(),
        }
    }
}

/// Append-only closed intervals plus at most one open interval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeLog {
    #[serde(rename = "downtimeLog")]
    closed: Vec<DowntimeInterval>,
    #[serde(rename = "openDowntime")]
    open: Option<OpenDowntime>,
}

impl DowntimeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new interval. Returns false if one is already open.
    pub fn open(&mut self, now: i64, reason: impl Into<String>) -> bool {
        if self.open.is_some() {
            return false;
        }
        self.open = Some(OpenDowntime::new(now, reason));
        true
    }

    /// Move the open interval into the log with `up_at = now`.
    /// Returns the closed interval, or None if nothing was open.
    pub fn close(&mut self, now: i64) -> Option<&DowntimeInterval> {
        let open = self.open.take()?;
        self.closed.push(open.closed_at(now));
        self.closed.last()
    }

    pub fn clear(&mut self) {
        self.closed.clear();
        self.open = None;
    }

    pub fn closed(&self) -> &[DowntimeInterval] {
        &self.closed
    }

    pub fn open_interval(&self) -> Option<&OpenDowntime> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Closed intervals plus the open one synthetically closed at `now`.
    /// The log itself is left untouched.
    pub fn effective_intervals(&self, now: i64) -> Vec<DowntimeInterval> {
        let mut intervals = self.closed.clone();
        if let Some(open) = &self.open {
            intervals.push(open.closed_at(now));
        }
        intervals
    }
}

/// Sum of interval durations in ms
pub fn total_ms(intervals: &[DowntimeInterval]) -> i64 {
    intervals.iter().map(DowntimeInterval::duration_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_then_close() {
        let mut log = DowntimeLog::new();
        assert!(log.open(1_000, "Tool change"));
        assert!(log.is_open());

        let closed = log.close(4_000).cloned().unwrap();
        assert_eq!(closed.down_at, 1_000);
        assert_eq!(closed.up_at, 4_000);
        assert_eq!(closed.description, "Tool change");
        assert!(!log.is_open());
        assert_eq!(total_ms(log.closed()), 3_000);
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let mut log = DowntimeLog::new();
        assert!(log.close(5_000).is_none());
        assert!(log.closed().is_empty());
    }

    #[test]
    fn test_second_open_is_ignored() {
        let mut log = DowntimeLog::new();
        assert!(log.open(1_000, "Jam"));
        assert!(!log.open(2_000, "Other"));
        assert_eq!(log.open_interval().map(|o| o.down_at), Some(1_000));
    }

    #[test]
    fn test_blank_reason_gets_default() {
        let mut log = DowntimeLog::new();
        log.open(0, "  ");
        assert_eq!(
            log.open_interval().map(|o| o.description.as_str()),
            Some(DEFAULT_DOWNTIME_REASON)
        );
    }

    #[test]
    fn test_effective_intervals_does_not_mutate() {
        let mut log = DowntimeLog::new();
        log.open(0, "A");
        log.close(1_000);
        log.open(2_000, "B");

        let effective = log.effective_intervals(5_000);
        assert_eq!(effective.len(), 2);
        assert_eq!(effective[1].up_at, 5_000);
        assert_eq!(total_ms(&effective), 4_000);

        assert!(log.is_open());
        assert_eq!(log.closed().len(), 1);
    }

    #[test]
    fn test_negative_duration_clamped() {
        let interval = DowntimeInterval {
            down_at: 10_000,
            up_at: 5_000,
            description: "skew".to_string(),
        };
        assert_eq!(interval.duration_ms(), 0);
    }

    #[test]
    fn test_close_before_open_keeps_up_at_and_clamps_duration() {
        let mut log = DowntimeLog::new();
        log.open(10_000, "skew");
        let closed = log.close(9_000).cloned().unwrap();
        assert_eq!(closed.up_at, 9_000);
        assert_eq!(closed.duration_ms(), 0);
        assert_eq!(total_ms(log.closed()), 0);
    }
}
