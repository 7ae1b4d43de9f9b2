//! Recommendation history.
//!
//! Keeps the runs of the current session and derives the metrics and
//! chart series shown to the user.

pub mod aggregator;

pub use aggregator::*;
