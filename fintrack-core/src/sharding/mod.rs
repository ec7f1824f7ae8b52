//! Owner-to-partition routing.
//!
//! Owners are assigned to fixed buckets by a stable hash; buckets are
//! numbered contiguously across shards in declaration order, and each
//! bucket belongs to exactly one shard. The assignment is immutable for
//! the lifetime of one topology; changing the shard layout requires
//! external rebalancing.

pub mod router;
pub mod topology;

pub use router::{RouterError, ShardConfig, ShardRouter};
pub use topology::{ShardTopology, TopologyError};
