//! In-process snapshot channel with consumer-group semantics.
//!
//! A bounded mpsc queue stands in for the external broker: each message is
//! received by exactly one worker of the group, and a worker that fails to
//! handle a message re-enqueues it, which is what makes delivery
//! at-least-once. A bounded buffer applies backpressure to publishers
//! instead of growing without limit.

use async_trait::async_trait;
use fintrack_sdk::objects::TransactionSnapshot;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use super::types::{ChannelError, SnapshotMessage, SnapshotPublisher};

/// Default buffer size for the snapshot channel.
///
/// Enough to absorb write bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Create a new snapshot channel.
///
/// Returns the publishing handle and the consuming handle. Both are
/// cheaply cloneable; cloning the receiver adds a worker to the same
/// consumer group rather than duplicating deliveries.
pub fn snapshot_queue(buffer: usize) -> (SnapshotQueue, SnapshotQueueReceiver) {
    let (tx, rx) = mpsc::channel(buffer);
    let receiver = SnapshotQueueReceiver {
        redeliver_tx: tx.downgrade(),
        rx: Arc::new(Mutex::new(rx)),
    };
    (SnapshotQueue { tx }, receiver)
}

/// Publishing half of the snapshot channel.
#[derive(Clone)]
pub struct SnapshotQueue {
    tx: mpsc::Sender<SnapshotMessage>,
}

impl SnapshotQueue {
    pub async fn send(&self, message: SnapshotMessage) -> Result<(), ChannelError> {
        self.tx.send(message).await.map_err(|_| ChannelError::Closed)
    }
}

#[async_trait]
impl SnapshotPublisher for SnapshotQueue {
    async fn publish(&self, snapshot: &TransactionSnapshot) -> Result<(), ChannelError> {
        let message = SnapshotMessage::encode(snapshot)?;
        tracing::debug!(
            message_id = %message.message_id,
            user_id = %snapshot.user_id,
            transactions = snapshot.transactions.len(),
            "snapshot published"
        );
        self.send(message).await
    }
}

/// Consuming half of the snapshot channel.
///
/// Workers of one group share the underlying receiver; whoever holds the
/// lock takes the next message. `redeliver` puts a failed message back on
/// the queue with its attempt counter bumped, through a weak handle so
/// the consumer side never keeps the channel open on its own.
#[derive(Clone)]
pub struct SnapshotQueueReceiver {
    redeliver_tx: mpsc::WeakSender<SnapshotMessage>,
    rx: Arc<Mutex<mpsc::Receiver<SnapshotMessage>>>,
}

impl SnapshotQueueReceiver {
    /// Next message, or `None` once every publisher is gone and the queue
    /// is drained.
    pub async fn recv(&self) -> Option<SnapshotMessage> {
        self.rx.lock().await.recv().await
    }

    pub async fn redeliver(&self, message: SnapshotMessage) -> Result<(), ChannelError> {
        let tx = self.redeliver_tx.upgrade().ok_or(ChannelError::Closed)?;
        tx.send(message.next_attempt())
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(user_id: &str) -> TransactionSnapshot {
        TransactionSnapshot {
            user_id: user_id.to_string(),
            transactions: vec![],
        }
    }

    #[tokio::test]
    async fn each_message_goes_to_exactly_one_receive() {
        let (queue, receiver) = snapshot_queue(8);
        queue.publish(&snapshot("a")).await.unwrap();
        queue.publish(&snapshot("b")).await.unwrap();

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.decode().unwrap().user_id, "a");
        assert_eq!(second.decode().unwrap().user_id, "b");
    }

    #[tokio::test]
    async fn redelivered_message_comes_back_with_bumped_attempt() {
        let (queue, receiver) = snapshot_queue(8);
        queue.publish(&snapshot("a")).await.unwrap();

        let message = receiver.recv().await.unwrap();
        let original_id = message.message_id;
        receiver.redeliver(message).await.unwrap();

        let again = receiver.recv().await.unwrap();
        assert_eq!(again.message_id, original_id);
        assert_eq!(again.attempt, 1);
    }

    #[tokio::test]
    async fn channel_closes_once_every_publisher_is_gone() {
        let (queue, receiver) = snapshot_queue(8);
        queue.publish(&snapshot("a")).await.unwrap();
        drop(queue);

        // The queued message still drains, then the channel reports closed.
        let message = receiver.recv().await.unwrap();
        assert_eq!(message.decode().unwrap().user_id, "a");
        assert!(receiver.recv().await.is_none());

        assert!(matches!(
            receiver.redeliver(message).await.unwrap_err(),
            ChannelError::Closed
        ));
    }
}
