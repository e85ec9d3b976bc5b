//! Compiled search terms.

use regex::{Regex, RegexBuilder};

use crate::error::{FilterError, Result};
use crate::types::Ticket;

/// Pseudo-field names that address the ticket identifier.
pub const ID_FIELD_NAMES: [&str; 2] = ["#", "number"];

/// Pattern used by `field:` to test for a blank field.
const EMPTY_VALUE_PATTERN: &str = "^$";

/// One compiled unit of a query: optional field abbreviation, pattern and
/// exclude flag. Immutable once built.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    /// Lowercased field abbreviation; `None` searches all fields.
    field: Option<String>,
    pattern: Regex,
    exclude: bool,
    matches_id: bool,
}

impl SearchTerm {
    /// Builds a term from a raw pattern, compiled case-insensitively.
    pub fn new(field: Option<&str>, pattern: &str, exclude: bool) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|error| FilterError::QueryParse(format!("invalid pattern: {error}")))?;
        Ok(Self::from_regex(field, pattern, exclude))
    }

    /// Builds a term matching only a blank value of the given field(s).
    pub fn blank_field(field: &str, exclude: bool) -> Result<Self> {
        Self::new(Some(field), EMPTY_VALUE_PATTERN, exclude)
    }

    fn from_regex(field: Option<&str>, pattern: Regex, exclude: bool) -> Self {
        let field = field
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase);
        let matches_id = match field.as_deref() {
            None => true,
            Some(abbreviation) => ID_FIELD_NAMES
                .iter()
                .any(|name| name.starts_with(abbreviation)),
        };
        Self {
            field,
            pattern,
            exclude,
            matches_id,
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_exclude(&self) -> bool {
        self.exclude
    }

    /// Whether the identifier is tested in addition to the fields.
    pub fn applies_to_id(&self) -> bool {
        self.matches_id
    }

    /// Whether this term searches a field of the given name.
    pub fn applies_to_field(&self, name: &str) -> bool {
        match self.field.as_deref() {
            None => true,
            Some(abbreviation) => name.to_lowercase().starts_with(abbreviation),
        }
    }

    /// Length of the explicit field abbreviation, 0 when unrestricted.
    pub(crate) fn specificity(&self) -> usize {
        self.field.as_ref().map_or(0, String::len)
    }

    /// Whether the pattern occurs in any candidate field or in the identifier.
    ///
    /// `id_text` is the decimal identifier, rendered lazily by the caller.
    pub fn found_in(&self, ticket: &Ticket, id_text: &str) -> bool {
        if self.matches_id && self.pattern.is_match(id_text) {
            return true;
        }
        let prefix = self.field.as_deref().unwrap_or("");
        ticket
            .fields
            .with_prefix(prefix)
            .any(|(_, value)| self.pattern.is_match(value))
    }
}
