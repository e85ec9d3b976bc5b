//! Incremental ticket filtering.
//!
//! This crate provides the filtering core for a ticket table:
//! - Query compilation into field-scoped search terms
//! - Batch partitioning of the ticket snapshot
//! - Parallel, cancellable evaluation on a worker pool
//! - Exactly-once publication of the live generation's result

pub mod cancel;
pub mod config;
pub mod error;
pub mod query;
pub mod search;
pub mod types;

// Re-export main types
pub use cancel::{CancellationToken, GenerationTracker};
pub use config::FilterConfig;
pub use error::{FilterError, Result};
pub use query::{CompiledQuery, QueryParser, SearchTerm};
pub use search::{
    partition, ticket_matches, ChannelSink, FilterCoordinator, FilterSink, FilterUpdate,
    FilterUpdates, InclusionMask, RowFilter,
};
pub use types::{FieldMap, Ticket, TicketId, TicketSnapshot};
