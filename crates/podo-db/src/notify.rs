//! # Notification Dispatch
//!
//! Gets notifications from the ledger into the notification ring without
//! making a sale wait on it.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Dispatch                                │
//! │                                                                         │
//! │  Ledger (after COMMIT)                                                 │
//! │       │  sink.emit(n)          try_send, never blocks                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  bounded mpsc channel                                           │   │
//! │  │  full / closed → warn!, notification dropped                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            NOTIFICATION WORKER (background task)                │   │
//! │  │                                                                 │   │
//! │  │  loop {                                                        │   │
//! │  │    recv → ring.push(n)                                         │   │
//! │  │    shutdown → drain what is queued, stop                       │   │
//! │  │  }                                                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The committed unit never depends on any of this succeeding.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::repository::notification::NotificationRing;
use podo_core::{Notification, NotificationSink};

// =============================================================================
// Channel Sink
// =============================================================================

/// [`NotificationSink`] that hands notifications to the worker.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Notification>,
}

impl NotificationSink for ChannelSink {
    fn emit(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                warn!(id = %n.id, kind = ?n.kind, "Notification channel full, dropping notification");
            }
            Err(TrySendError::Closed(n)) => {
                warn!(id = %n.id, kind = ?n.kind, "Notification worker stopped, dropping notification");
            }
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Background task that drains the channel into the ring.
pub struct NotificationWorker {
    ring: NotificationRing,
    rx: mpsc::Receiver<Notification>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the worker.
pub struct NotificationWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl NotificationWorkerHandle {
    /// Stops the worker after it has stored everything already queued.
    pub async fn shutdown(self) {
        // a send error means the worker already exited
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            error!(?e, "Notification worker panicked");
        }
    }
}

impl NotificationWorker {
    /// Creates a worker and the sink that feeds it.
    ///
    /// `channel_size` bounds how many notifications can wait for storage.
    pub fn new(ring: NotificationRing, channel_size: usize) -> (Self, ChannelSink) {
        let (tx, rx) = mpsc::channel(channel_size.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let worker = NotificationWorker {
            ring,
            rx,
            shutdown_tx,
            shutdown_rx,
        };
        (worker, ChannelSink { tx })
    }

    /// Spawns the worker on the current runtime.
    pub fn spawn(ring: NotificationRing, channel_size: usize) -> (ChannelSink, NotificationWorkerHandle) {
        let (worker, sink) = Self::new(ring, channel_size);
        let shutdown_tx = worker.shutdown_tx.clone();

        let join = tokio::spawn(worker.run());
        (sink, NotificationWorkerHandle { shutdown_tx, join })
    }

    /// Runs the worker loop until shutdown or until every sink is dropped.
    pub async fn run(mut self) {
        info!(capacity = self.ring.capacity(), "Notification worker starting");

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(n) => self.store(n).await,
                    None => {
                        debug!("All notification sinks dropped");
                        break;
                    }
                },

                _ = self.shutdown_rx.recv() => {
                    info!("Notification worker shutting down");
                    self.rx.close();
                    while let Some(n) = self.rx.recv().await {
                        self.store(n).await;
                    }
                    break;
                }
            }
        }

        info!("Notification worker stopped");
    }

    async fn store(&self, notification: Notification) {
        let id = notification.id.clone();
        if let Err(e) = self.ring.push(notification).await {
            error!(%id, ?e, "Failed to store notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use podo_core::{NotificationKind, NotificationTarget};

    fn note(msg: &str) -> Notification {
        Notification::new(NotificationKind::System, msg, NotificationTarget::All, Utc::now())
    }

    #[tokio::test]
    async fn test_worker_stores_then_drains_on_shutdown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ring = NotificationRing::new(db, 100);
        let (sink, handle) = NotificationWorker::spawn(ring.clone(), 16);

        sink.emit(note("first"));
        sink.emit(note("second"));
        handle.shutdown().await;

        let msgs: Vec<String> = ring.recent(None, 10).await.unwrap().into_iter().map(|n| n.message).collect();
        assert_eq!(msgs, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ring = NotificationRing::new(db, 100);
        // room for one; the worker starts only after both emits
        let (worker, sink) = NotificationWorker::new(ring.clone(), 1);

        sink.emit(note("kept"));
        sink.emit(note("dropped"));
        assert!(ring.recent(None, 10).await.unwrap().is_empty());

        // closing the last sink ends the worker once the queue is empty
        drop(sink);
        worker.run().await;

        let msgs: Vec<String> = ring.recent(None, 10).await.unwrap().into_iter().map(|n| n.message).collect();
        assert_eq!(msgs, vec!["kept"]);
    }

    #[tokio::test]
    async fn test_closed_channel_is_harmless() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ring = NotificationRing::new(db, 100);
        let (worker, sink) = NotificationWorker::new(ring, 4);
        drop(worker);

        sink.emit(note("nobody listening"));
    }
}
