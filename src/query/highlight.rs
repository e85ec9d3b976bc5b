//! Highlight ranges for the description view.
//!
//! Collects every match of the include terms that apply to the displayed
//! field, then merges overlapping or touching ranges into sorted,
//! non-overlapping spans. Exclude terms never highlight anything, and empty
//! matches (such as the blank-field pattern) are skipped.

use std::collections::BTreeSet;
use std::ops::Range;

use super::term::SearchTerm;

/// Returns sorted, merged byte ranges of `text` matched by `terms`.
pub fn highlight_ranges(terms: &[SearchTerm], field_name: &str, text: &str) -> Vec<Range<usize>> {
    let mut collector = HighlightCollector::default();
    for term in terms {
        if term.is_exclude() || !term.applies_to_field(field_name) {
            continue;
        }
        collector.collect(term, text);
    }
    collector.into_ranges()
}

#[derive(Default)]
struct HighlightCollector {
    spans: BTreeSet<(usize, usize)>,
}

impl HighlightCollector {
    fn collect(&mut self, term: &SearchTerm, text: &str) {
        for found in term.pattern().find_iter(text) {
            if found.start() < found.end() {
                self.spans.insert((found.start(), found.end()));
            }
        }
    }

    fn into_ranges(self) -> Vec<Range<usize>> {
        let mut merged: Vec<Range<usize>> = Vec::new();
        for (start, end) in self.spans {
            match merged.last_mut() {
                Some(last) if start <= last.end => last.end = last.end.max(end),
                _ => merged.push(start..end),
            }
        }
        merged
    }
}
