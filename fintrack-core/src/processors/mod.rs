//! Supervised background workers.

pub mod snapshot_worker;

pub use snapshot_worker::SnapshotWorker;
