//! Elapsed-time ticker
//!
//! A cancellable periodic task bound to one machine run. It publishes
//! `now - start_time` (ms) on a watch channel every period and never touches
//! machine state. The owner stops it when the run's start time is cleared;
//! dropping the ticker stops it as well.

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::constants::MIN_TICK_INTERVAL;
use crate::port::TimeProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

pub struct ElapsedTicker {
    start_time: i64,
    stop: ShutdownSender,
    elapsed: watch::Receiver<i64>,
    handle: JoinHandle<()>,
}

impl ElapsedTicker {
    /// Spawn a ticker for a run that started at `start_time` (epoch ms).
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        start_time: i64,
        period: Duration,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let (stop, mut token) = shutdown_channel();
        let initial = (time_provider.now_millis() - start_time).max(0);
        let (tx, rx) = watch::channel(initial);
        let period = period.max(MIN_TICK_INTERVAL);

        let handle = tokio::spawn(async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                if token.is_shutdown() {
                    break;
                }
                tokio::select! {
                    _ = tick.tick() => {
                        let elapsed = (time_provider.now_millis() - start_time).max(0);
                        if tx.send(elapsed).is_err() {
                            break;
                        }
                    }
                    _ = token.wait() => break,
                }
            }
            debug!(start_time, "Elapsed ticker stopped");
        });

        Self {
            start_time,
            stop,
            elapsed: rx,
            handle,
        }
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Latest published elapsed time (ms)
    pub fn elapsed_ms(&self) -> i64 {
        *self.elapsed.borrow()
    }

    /// Receiver that observes every published reading
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.elapsed.clone()
    }

    /// Stop the ticker, returning the task handle so callers may await it
    pub fn stop(self) -> JoinHandle<()> {
        self.stop.shutdown();
        self.handle
    }
}
