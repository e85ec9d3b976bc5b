//! Term ordering.
//!
//! Terms with a longer field abbreviation select fewer fields and are checked
//! first, so a ticket is usually rejected by its cheapest test. The order
//! never changes which tickets are included.

use std::cmp::Reverse;

use super::term::SearchTerm;

/// Sorts terms by field abbreviation length, longest first.
///
/// The sort is stable: terms of equal specificity keep their query order.
pub fn order_by_specificity(terms: &mut [SearchTerm]) {
    terms.sort_by_key(|term| Reverse(term.specificity()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(field: Option<&str>, pattern: &str) -> SearchTerm {
        SearchTerm::new(field, pattern, false).expect("term")
    }

    #[test]
    fn fieldless_terms_sort_last() {
        let mut terms = vec![term(None, "a"), term(Some("st"), "b"), term(None, "c")];
        order_by_specificity(&mut terms);
        assert_eq!(terms[0].field(), Some("st"));
        assert_eq!(terms[1].pattern().as_str(), "a");
        assert_eq!(terms[2].pattern().as_str(), "c");
    }

    #[test]
    fn equal_specificity_keeps_query_order() {
        let mut terms = vec![
            term(Some("owner"), "x"),
            term(Some("state"), "y"),
            term(Some("summary"), "z"),
        ];
        order_by_specificity(&mut terms);
        let fields: Vec<_> = terms.iter().map(SearchTerm::field).collect();
        assert_eq!(fields, vec![Some("summary"), Some("owner"), Some("state")]);
    }
}
