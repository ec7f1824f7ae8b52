use async_trait::async_trait;
use bytes::Bytes;
use fintrack_sdk::objects::TransactionSnapshot;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("encode snapshot payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode snapshot payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("snapshot channel closed")]
    Closed,
}

/// One snapshot event as carried by the channel.
///
/// The payload is the snapshot serialized as a self-describing JSON
/// document with stable field names; consumers ignore unknown fields and
/// default missing optional ones, so the format can evolve additively.
/// `attempt` counts deliveries of this message, for redelivery logging.
#[derive(Debug, Clone)]
pub struct SnapshotMessage {
    pub message_id: Uuid,
    pub attempt: u32,
    pub payload: Bytes,
}

impl SnapshotMessage {
    /// Serialize a snapshot into a first-delivery message.
    pub fn encode(snapshot: &TransactionSnapshot) -> Result<Self, ChannelError> {
        let payload = serde_json::to_vec(snapshot).map_err(ChannelError::Encode)?;
        Ok(Self {
            message_id: Uuid::new_v4(),
            attempt: 0,
            payload: Bytes::from(payload),
        })
    }

    pub fn decode(&self) -> Result<TransactionSnapshot, ChannelError> {
        serde_json::from_slice(&self.payload).map_err(ChannelError::Decode)
    }

    /// The same message, marked as redelivered once more.
    pub fn next_attempt(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// Publishing seam for the write orchestrator.
///
/// `publish` succeeds only once the channel has durably accepted the
/// message; a failed publish propagates to the write path's caller.
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    async fn publish(&self, snapshot: &TransactionSnapshot) -> Result<(), ChannelError>;
}
