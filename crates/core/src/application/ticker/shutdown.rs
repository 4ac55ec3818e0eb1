// Ticker Stop Token

use tokio::sync::watch;

/// Stop signal for a background ticker
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if stop was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the stop signal (also returns once the sender is dropped)
    pub async fn wait(&mut self) {
        let _ = self.rx.changed().await;
    }
}

/// Stop sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal stop to the ticker
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a stop channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
