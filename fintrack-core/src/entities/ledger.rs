//! CRUD against one shard's `transactions` table.
//!
//! Every operation resolves the owner's pool through the shard router and
//! executes a single statement; atomicity comes from the store itself.
//! Update and delete match on both `id` and `user_id`, so a valid id owned
//! by a different owner is a `NotFound`, not a cross-owner mutation.

use async_trait::async_trait;
use fintrack_sdk::objects::{Transaction, TransactionDraft};
use std::sync::Arc;
use thiserror::Error;

use super::{TransactionKind, TransactionRow};
use crate::sharding::ShardRouter;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction not found")]
    NotFound,

    #[error("ledger store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Capability seam over the ledger store, so orchestrators can be tested
/// against in-memory fakes.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Insert a row; the store assigns `id` and `created_at`.
    async fn create(
        &self,
        user_id: &str,
        draft: &TransactionDraft,
    ) -> Result<Transaction, LedgerError>;

    /// All rows for an owner, oldest first, id ascending as tie-break.
    /// Returns an empty vec, never an error, for an unknown owner.
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, LedgerError>;

    async fn update(
        &self,
        user_id: &str,
        id: i64,
        draft: &TransactionDraft,
    ) -> Result<Transaction, LedgerError>;

    async fn delete(&self, user_id: &str, id: i64) -> Result<(), LedgerError>;
}

/// Postgres-backed ledger repository, routed per owner.
pub struct PgLedgerRepository {
    router: Arc<ShardRouter>,
}

impl PgLedgerRepository {
    pub fn new(router: Arc<ShardRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    #[tracing::instrument(skip_all, err, name = "SQL:CreateTransaction", fields(user_id = %user_id))]
    async fn create(
        &self,
        user_id: &str,
        draft: &TransactionDraft,
    ) -> Result<Transaction, LedgerError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (user_id, amount, category, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, amount, category, kind, created_at
            "#,
        )
        .bind(user_id)
        .bind(draft.amount)
        .bind(&draft.category)
        .bind(TransactionKind::from(draft.kind))
        .fetch_one(self.router.pool_for_owner(user_id))
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:ListTransactions", fields(user_id = %user_id))]
    async fn list(&self, user_id: &str) -> Result<Vec<Transaction>, LedgerError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, amount, category, kind, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.router.pool_for_owner(user_id))
        .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:UpdateTransaction", fields(user_id = %user_id, id = id))]
    async fn update(
        &self,
        user_id: &str,
        id: i64,
        draft: &TransactionDraft,
    ) -> Result<Transaction, LedgerError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
            SET amount = $1,
                category = $2,
                kind = $3
            WHERE id = $4 AND user_id = $5
            RETURNING id, user_id, amount, category, kind, created_at
            "#,
        )
        .bind(draft.amount)
        .bind(&draft.category)
        .bind(TransactionKind::from(draft.kind))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.router.pool_for_owner(user_id))
        .await?;

        row.map(Transaction::from).ok_or(LedgerError::NotFound)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:DeleteTransaction", fields(user_id = %user_id, id = id))]
    async fn delete(&self, user_id: &str, id: i64) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            DELETE FROM transactions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(self.router.pool_for_owner(user_id))
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }
}
