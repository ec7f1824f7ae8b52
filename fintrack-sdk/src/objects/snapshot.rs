use serde::{Deserialize, Serialize};

use super::Transaction;

/// The payload published after every mutation: an owner's complete current
/// transaction list, never a delta.
///
/// A snapshot fully replaces any previously seen state for the same owner,
/// so duplicate or out-of-order delivery is harmless for consumers that
/// recompute from the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub user_id: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}
