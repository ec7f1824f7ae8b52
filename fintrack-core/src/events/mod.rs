//! Snapshot event transport.
//!
//! The write side publishes an owner's complete ledger after every
//! mutation; consumers recompute aggregates from the full list, so the
//! channel only has to promise at-least-once delivery. Handlers must
//! tolerate seeing the same message more than once.

pub mod channels;
pub mod types;

pub use channels::{DEFAULT_CHANNEL_BUFFER, SnapshotQueue, SnapshotQueueReceiver, snapshot_queue};
pub use types::{ChannelError, SnapshotMessage, SnapshotPublisher};
