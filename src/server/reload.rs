// src/server/reload.rs

use tokio::sync::broadcast;
use tracing::debug;

/// Best-effort reload notification channel between tasks and the dev
/// server's connected clients.
///
/// Tasks call [`notify`](ReloadHub::notify) after writing output; delivery
/// failures (no connected clients, lagged receivers) are silently ignored.
/// One notification is sent per completed task invocation.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<()>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Push a reload signal to every connected client. Never fails.
    pub fn notify(&self) {
        let receivers = self.tx.receiver_count();
        let _ = self.tx.send(());
        debug!(receivers, "reload notification sent");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
