//! Cooperative shutdown signaling
//!
//! Broadcast-based cancellation for the reconciliation loop and other
//! long-lived background tasks. Cancellation is cooperative: tasks observe
//! the signal at cycle boundaries and while blocked on network calls via
//! `select!`, but in-flight work is never preempted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shutdown signal broadcaster
///
/// Clone the signal to hand it to task owners; each task awaits
/// [`ShutdownSignal::cancelled`] to observe the trigger.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: Arc<broadcast::Sender<()>>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a new, untriggered shutdown signal
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender: Arc::new(sender),
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trigger shutdown for every listener
    pub fn shutdown(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.sender.send(());
    }

    /// Whether shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is triggered
    ///
    /// Resolves immediately if the signal already fired; safe to use inside
    /// `select!` arms.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The flag is set before the broadcast, so checking it after
        // subscribing closes the gap between a missed send and recv().
        if self.triggered.load(Ordering::SeqCst) {
            return;
        }
        // Lagged/Closed both mean the signal fired or is going away.
        let _ = receiver.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_releases_waiter() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            42
        });

        // Give the waiter a chance to subscribe before triggering.
        tokio::task::yield_now().await;
        signal.shutdown();

        assert_eq!(handle.await.unwrap(), 42);
    }
}
