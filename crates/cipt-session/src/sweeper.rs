//! Background sweeper that closes quiet sessions.
//!
//! Expiry is an explicit event: the sweeper removes idle sessions from the
//! store and sends the chat ids over a channel, and whoever owns the reply
//! channel drains it and sends the closing notice. The sweeper itself never
//! talks to the transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};

use crate::store::SessionStore;

/// Periodic scan over the session store.
pub struct SessionSweeper {
    store: Arc<SessionStore>,
    idle_close: Duration,
    sweep_interval: Duration,
    shutdown: Arc<Notify>,
}

impl SessionSweeper {
    pub fn new(store: Arc<SessionStore>, idle_close: Duration, sweep_interval: Duration) -> Self {
        Self {
            store,
            idle_close,
            sweep_interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle that stops the sweep loop when notified.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Run the sweep loop until shut down, sending every expired chat id on
    /// `expired_tx`. A closed receiver also stops the loop.
    pub async fn run(self, expired_tx: mpsc::UnboundedSender<String>) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            idle_secs = self.idle_close.as_secs(),
            "Session sweeper started"
        );
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("Session sweeper stopped");
                    return;
                }
                _ = tokio::time::sleep(self.sweep_interval) => {
                    let expired = self.store.expire_idle(self.idle_close);
                    if expired.is_empty() {
                        continue;
                    }
                    debug!(count = expired.len(), "Sessions expired");
                    for chat_id in expired {
                        if expired_tx.send(chat_id).is_err() {
                            info!("Expiry channel closed, stopping sweeper");
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweeper_emits_expired_ids() {
        let store = Arc::new(SessionStore::new(6));
        store.touch("quieto");

        let sweeper = SessionSweeper::new(
            Arc::clone(&store),
            Duration::ZERO,
            Duration::from_millis(10),
        );
        let shutdown = sweeper.shutdown_handle();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(sweeper.run(tx));

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired, "quieto");
        assert!(store.is_empty());

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_shutdown_before_any_sweep() {
        let store = Arc::new(SessionStore::new(6));
        let sweeper = SessionSweeper::new(
            Arc::clone(&store),
            Duration::from_secs(300),
            Duration::from_secs(3600),
        );
        let shutdown = sweeper.shutdown_handle();
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(sweeper.run(tx));

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_stops_when_receiver_dropped() {
        let store = Arc::new(SessionStore::new(6));
        store.touch("chat");
        let sweeper = SessionSweeper::new(
            Arc::clone(&store),
            Duration::ZERO,
            Duration::from_millis(10),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        // Must terminate on its own once the send fails.
        tokio::spawn(sweeper.run(tx)).await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_leaves_active_sessions() {
        let store = Arc::new(SessionStore::new(6));
        store.touch("ativo");
        let sweeper = SessionSweeper::new(
            Arc::clone(&store),
            Duration::from_secs(300),
            Duration::from_millis(10),
        );
        let shutdown = sweeper.shutdown_handle();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(sweeper.run(tx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(store.len(), 1);

        shutdown.notify_one();
        handle.await.unwrap();
    }
}
