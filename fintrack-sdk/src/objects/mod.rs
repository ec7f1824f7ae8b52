pub mod snapshot;
pub mod stats;
pub mod transaction;

pub use snapshot::TransactionSnapshot;
pub use stats::FinanceStats;
pub use transaction::{Transaction, TransactionDraft, TransactionKind};
