// Application constants (no magic values)
use std::time::Duration;

/// Elapsed-time refresh period for a running machine (1s)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest tick period accepted (tokio intervals reject zero)
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
