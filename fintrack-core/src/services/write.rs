//! Write orchestrator: mutate the ledger, then republish the owner's
//! complete current transaction list as a snapshot event.
//!
//! Full-snapshot republish rather than deltas means downstream consumers
//! can recompute from scratch on every event, so duplicate, redelivered or
//! out-of-order snapshots are all harmless; the only requirement is that
//! some snapshot eventually lands after the last write.

use fintrack_sdk::objects::{Transaction, TransactionDraft, TransactionSnapshot};
use std::sync::Arc;
use thiserror::Error;

use crate::entities::ledger::{LedgerError, LedgerRepository};
use crate::events::{ChannelError, SnapshotPublisher};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("publish snapshot: {0}")]
    Channel(#[from] ChannelError),
}

/// Orchestrates create/update/delete against the sharded ledger and the
/// snapshot republish that follows every successful mutation.
pub struct TransactionService {
    repo: Arc<dyn LedgerRepository>,
    publisher: Arc<dyn SnapshotPublisher>,
}

impl TransactionService {
    pub fn new(repo: Arc<dyn LedgerRepository>, publisher: Arc<dyn SnapshotPublisher>) -> Self {
        Self { repo, publisher }
    }

    pub async fn create_transaction(
        &self,
        user_id: &str,
        draft: &TransactionDraft,
    ) -> Result<Transaction, WriteError> {
        let created = self.repo.create(user_id, draft).await?;
        self.publish_snapshot(user_id).await?;
        Ok(created)
    }

    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, WriteError> {
        Ok(self.repo.list(user_id).await?)
    }

    pub async fn update_transaction(
        &self,
        user_id: &str,
        id: i64,
        draft: &TransactionDraft,
    ) -> Result<Transaction, WriteError> {
        let updated = self.repo.update(user_id, id, draft).await?;
        self.publish_snapshot(user_id).await?;
        Ok(updated)
    }

    pub async fn delete_transaction(&self, user_id: &str, id: i64) -> Result<(), WriteError> {
        self.repo.delete(user_id, id).await?;
        self.publish_snapshot(user_id).await
    }

    /// List the owner's full current ledger and publish it as one snapshot.
    ///
    /// Known gap: if listing or publishing fails here, the mutation has
    /// already durably committed but the caller still sees an error, and
    /// no retry happens. The cached view then converges only after the
    /// owner's next successful publish.
    async fn publish_snapshot(&self, user_id: &str) -> Result<(), WriteError> {
        let transactions = self.repo.list(user_id).await?;
        let snapshot = TransactionSnapshot {
            user_id: user_id.to_owned(),
            transactions,
        };
        self.publisher.publish(&snapshot).await.map_err(|e| {
            tracing::error!(
                user_id = %user_id,
                error = %e,
                "mutation committed but snapshot publish failed"
            );
            WriteError::Channel(e)
        })
    }
}
