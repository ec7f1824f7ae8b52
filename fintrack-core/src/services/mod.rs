pub mod read;
pub mod write;

pub use read::{AnalyticsService, StatsError, TransactionFetcher};
pub use write::{TransactionService, WriteError};
