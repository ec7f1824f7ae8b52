pub mod aggregator;

pub use aggregator::calculate_stats;
