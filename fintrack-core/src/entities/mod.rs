pub mod ledger;

pub use ledger::{LedgerError, LedgerRepository, PgLedgerRepository};

use fintrack_sdk::objects::{Transaction, TransactionKind as SdkTransactionKind};
use rust_decimal::Decimal;
use time::OffsetDateTime;

/// Transaction kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `fintrack_sdk::objects::TransactionKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "transaction_kind")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl From<TransactionKind> for SdkTransactionKind {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::Income => SdkTransactionKind::Income,
            TransactionKind::Expense => SdkTransactionKind::Expense,
        }
    }
}

impl From<SdkTransactionKind> for TransactionKind {
    fn from(value: SdkTransactionKind) -> Self {
        match value {
            SdkTransactionKind::Income => TransactionKind::Income,
            SdkTransactionKind::Expense => TransactionKind::Expense,
        }
    }
}

/// One row of a shard's `transactions` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub user_id: String,
    pub amount: Decimal,
    pub category: String,
    pub kind: TransactionKind,
    pub created_at: OffsetDateTime,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            category: row.category,
            kind: row.kind.into(),
            created_at: row.created_at,
        }
    }
}
