// Duration & timestamp display helpers

use chrono::TimeZone;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Placeholder for a missing timestamp
pub const MISSING_TIMESTAMP: &str = "NA";

/// Format a millisecond span as `Hh Mm Ss`.
///
/// Hours are omitted when zero, minutes when both hours and minutes are
/// zero; seconds are always shown. Negative spans format as `0s`.
pub fn format_duration(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms / MS_PER_MINUTE) % 60;
    let seconds = (ms / MS_PER_SECOND) % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Format an epoch-ms timestamp as `M/D/YYYY, h:mm:ss AM` in `tz`
pub fn format_timestamp<Tz: TimeZone>(ms: Option<i64>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ms.and_then(|ms| tz.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| MISSING_TIMESTAMP.to_string())
}
