//! Compiled query handed to the filter coordinator.

use std::ops::Range;
use std::sync::Arc;

use crate::search::ticket_matches;
use crate::types::Ticket;

use super::highlight::highlight_ranges;
use super::optimizer::order_by_specificity;
use super::parser::QueryParser;
use super::term::SearchTerm;

/// An ordered, immutable list of search terms.
///
/// Cloning shares the terms, so each filtering generation can keep its own
/// handle without copying patterns.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    terms: Arc<[SearchTerm]>,
}

impl Default for CompiledQuery {
    fn default() -> Self {
        Self {
            terms: Arc::from(Vec::new()),
        }
    }
}

impl CompiledQuery {
    /// Compiles raw query text.
    ///
    /// A query with any invalid pattern compiles to no terms at all, which
    /// matches every ticket.
    pub fn compile(raw_query: &str) -> Self {
        match QueryParser::parse(raw_query) {
            Ok(terms) => Self {
                terms: terms.into(),
            },
            Err(error) => {
                log::debug!("ticket filter query matches everything query={raw_query:?} error={error}");
                Self::default()
            }
        }
    }

    /// Builds a query from already compiled terms.
    pub fn from_terms(mut terms: Vec<SearchTerm>) -> Self {
        order_by_specificity(&mut terms);
        Self {
            terms: terms.into(),
        }
    }

    pub fn terms(&self) -> &[SearchTerm] {
        &self.terms
    }

    /// True when the query matches everything.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Evaluates the query against a single ticket.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        ticket_matches(ticket, &self.terms)
    }

    /// Byte ranges of `text` to highlight when showing field `field_name`.
    pub fn highlight_ranges(&self, field_name: &str, text: &str) -> Vec<Range<usize>> {
        highlight_ranges(&self.terms, field_name, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_empty() {
        assert!(CompiledQuery::compile("").is_empty());
        assert!(CompiledQuery::compile("   ").is_empty());
    }

    #[test]
    fn invalid_pattern_anywhere_matches_everything() {
        for raw in ["(", "bug (", "status:*open", "-summary:[a bug"] {
            let query = CompiledQuery::compile(raw);
            assert!(query.is_empty(), "{raw:?} should compile to no terms");
        }
    }

    #[test]
    fn matches_single_ticket() {
        let ticket = Ticket::new(3)
            .with_field("summary", "Fix bug")
            .with_field("status", "closed");
        assert!(CompiledQuery::compile("bug").matches(&ticket));
        assert!(!CompiledQuery::compile("-bug").matches(&ticket));
        assert!(CompiledQuery::compile("").matches(&ticket));
    }

    #[test]
    fn from_terms_orders_terms() {
        let query = CompiledQuery::from_terms(vec![
            SearchTerm::new(None, "a", false).expect("term"),
            SearchTerm::new(Some("status"), "b", false).expect("term"),
        ]);
        assert_eq!(query.len(), 2);
        assert_eq!(query.terms()[0].field(), Some("status"));
    }
}
