//! Application state shared across all request handlers.

use fintrack_core::services::{AnalyticsService, TransactionService};
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Write path: sharded ledger mutations plus snapshot publishing.
    pub write: Arc<TransactionService>,
    /// Read path: cache-aside stats serving.
    pub read: Arc<AnalyticsService>,
}

impl AppState {
    pub fn new(write: Arc<TransactionService>, read: Arc<AnalyticsService>) -> Self {
        Self { write, read }
    }
}
