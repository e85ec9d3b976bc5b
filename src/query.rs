//! Query compilation for ticket filtering.
//!
//! This module provides the query language of the ticket filter:
//! - Search terms (field abbreviation, pattern, exclude flag)
//! - Word parsing (`[-][field:][-]pattern`)
//! - Term ordering (most specific field first)
//! - Highlight ranges for the description view

mod highlight;
mod matcher;
mod optimizer;
mod parser;
mod term;

// Re-export public types
pub use matcher::CompiledQuery;
pub use parser::QueryParser;
pub use term::{SearchTerm, ID_FIELD_NAMES};
