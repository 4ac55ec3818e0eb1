// Job id allocation

use crate::domain::JobId;
use std::sync::atomic::{AtomicI64, Ordering};

/// Hands out creation-time job ids (epoch ms), bumping forward on
/// collisions so ids stay unique within the process.
#[derive(Debug, Default)]
pub struct JobIdAllocator {
    last: AtomicI64,
}

impl JobIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: `max(now, last + 1)`
    pub fn next(&self, now: i64) -> JobId {
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(current.saturating_add(1));
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}
