//! Query word parser.

use crate::error::Result;

use super::optimizer::order_by_specificity;
use super::term::SearchTerm;

const EXCLUDE_MARKER: char = '-';
const FIELD_SEPARATOR: char = ':';

/// Strict parser for the filter query language.
///
/// A query is a whitespace-separated list of words, each of the form
/// `[-][field:][-]pattern`. Every word contributes at most one term and all
/// terms must hold for a ticket to be included.
pub struct QueryParser;

impl QueryParser {
    /// Parses `input` into ordered search terms.
    ///
    /// Fails on the first word whose pattern is not a valid regular
    /// expression. Blank input yields no terms.
    pub fn parse(input: &str) -> Result<Vec<SearchTerm>> {
        let mut terms = Vec::new();
        for word in input.split_whitespace() {
            if let Some(term) = parse_word(word)? {
                terms.push(term);
            }
        }
        order_by_specificity(&mut terms);
        Ok(terms)
    }
}

// ---------------------------------------------------------------------------
// Word parsing
// ---------------------------------------------------------------------------

/// Parses one word. Returns `Ok(None)` for words that contribute nothing.
fn parse_word(word: &str) -> Result<Option<SearchTerm>> {
    let (mut exclude, rest) = strip_exclude(word);

    let (field, pattern) = match rest.split_once(FIELD_SEPARATOR) {
        Some((field, pattern)) => {
            let (excluded_after_field, pattern) = strip_exclude(pattern);
            exclude |= excluded_after_field;
            (Some(field).filter(|name| !name.is_empty()), pattern)
        }
        None => (None, rest),
    };

    if pattern.is_empty() {
        return match field {
            Some(field) => SearchTerm::blank_field(field, exclude).map(Some),
            None => Ok(None),
        };
    }

    SearchTerm::new(field, pattern, exclude).map(Some)
}

fn strip_exclude(text: &str) -> (bool, &str) {
    match text.strip_prefix(EXCLUDE_MARKER) {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    fn single(input: &str) -> SearchTerm {
        let mut terms = QueryParser::parse(input).expect("parse");
        assert_eq!(terms.len(), 1, "expected one term for {input:?}");
        terms.remove(0)
    }

    #[test]
    fn blank_input_has_no_terms() {
        assert!(QueryParser::parse("").expect("parse").is_empty());
        assert!(QueryParser::parse("   \t\n").expect("parse").is_empty());
    }

    #[test]
    fn plain_word_searches_everything() {
        let term = single("bug");
        assert_eq!(term.field(), None);
        assert!(!term.is_exclude());
        assert!(term.applies_to_id());
    }

    #[test]
    fn leading_minus_excludes() {
        let term = single("-bug");
        assert!(term.is_exclude());
        assert!(term.pattern().is_match("BUG"));
    }

    #[test]
    fn field_prefix_restricts_search() {
        let term = single("status:open");
        assert_eq!(term.field(), Some("status"));
        assert!(!term.is_exclude());
        assert!(term.pattern().is_match("Open"));
    }

    #[test]
    fn minus_on_either_side_of_field_excludes() {
        assert!(single("status:-open").is_exclude());
        assert!(single("-status:open").is_exclude());
        assert!(single("-status:-open").is_exclude());
    }

    #[test]
    fn empty_pattern_with_field_tests_blank_value() {
        let term = single("status:");
        assert_eq!(term.field(), Some("status"));
        assert!(term.pattern().is_match(""));
        assert!(!term.pattern().is_match("x"));

        let excluded = single("-owner:");
        assert!(excluded.is_exclude());
        assert!(excluded.pattern().is_match(""));
    }

    #[test]
    fn words_without_pattern_or_field_are_dropped() {
        assert!(QueryParser::parse("- : -: :-").expect("parse").is_empty());
        assert_eq!(QueryParser::parse("bug - :").expect("parse").len(), 1);
    }

    #[test]
    fn only_first_colon_separates_field() {
        let term = single("url:http://example");
        assert_eq!(term.field(), Some("url"));
        assert!(term.pattern().is_match("see http://example.org"));
    }

    #[test]
    fn empty_field_name_searches_everything() {
        let term = single(":bug");
        assert_eq!(term.field(), None);
    }

    #[test]
    fn invalid_pattern_fails_the_whole_parse() {
        assert!(matches!(
            QueryParser::parse("bug status:[open"),
            Err(FilterError::QueryParse(_))
        ));
    }

    #[test]
    fn terms_are_ordered_by_field_specificity() {
        let terms = QueryParser::parse("crash s:new component:ui milestone:1.0").expect("parse");
        let fields: Vec<_> = terms.iter().map(SearchTerm::field).collect();
        assert_eq!(
            fields,
            vec![Some("component"), Some("milestone"), Some("s"), None]
        );
    }
}
