//! Concurrent filtering of ticket snapshots.
//!
//! This module provides:
//! - The FilterCoordinator API (worker pool, generations, cancellation)
//! - Batch partitioning and per-ticket evaluation
//! - Inclusion masks and result delivery to the caller

mod coordinator;
mod evaluate;
mod generation;
mod mask;
mod partition;
mod sink;

// Re-export main types
pub use coordinator::FilterCoordinator;
pub use evaluate::ticket_matches;
pub use mask::{InclusionMask, RowFilter};
pub use partition::partition;
pub use sink::{ChannelSink, FilterSink, FilterUpdate, FilterUpdates};
