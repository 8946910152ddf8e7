//! Process-wide running flag
//!
//! Set once at shutdown, never reset. Loops can check it without blocking
//! or await the transition, which is what wakes the network task out of its
//! readiness wait.

use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative shutdown flag
#[derive(Debug, Clone)]
pub struct RunningFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl RunningFlag {
    /// Create a flag in the running state
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Whether shutdown has not been requested
    pub fn is_running(&self) -> bool {
        *self.tx.borrow()
    }

    /// Request shutdown and wake every waiter
    pub fn stop(&self) {
        self.tx.send_replace(false);
    }

    /// Resolve once shutdown has been requested
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|running| !*running).await;
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}
