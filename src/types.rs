//! Ticket records and the immutable snapshot the filter works on.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub type TicketId = u64;

/// One field of a ticket, stored under its lowercased name for prefix lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldEntry {
    key: String,
    name: String,
    value: String,
}

/// Field name to value mapping with case-insensitive prefix lookup.
///
/// Entries are kept sorted by lowercased name, so all names sharing a prefix
/// form one contiguous run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct FieldMap {
    entries: Vec<FieldEntry>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing the value of an identically named field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let key = name.to_lowercase();
        match self
            .entries
            .binary_search_by(|entry| {
                (entry.key.as_str(), entry.name.as_str()).cmp(&(key.as_str(), name.as_str()))
            })
        {
            Ok(position) => self.entries[position].value = value,
            Err(position) => self.entries.insert(position, FieldEntry { key, name, value }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(position).value)
    }

    /// Exact (case-sensitive) lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs ordered by lowercased name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
    }

    /// Iterates the fields whose name starts with `prefix`, ignoring case.
    ///
    /// `prefix` must already be lowercased.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        let start = self
            .entries
            .partition_point(|entry| entry.key.as_str() < prefix);
        self.entries[start..]
            .iter()
            .take_while(move |entry| entry.key.starts_with(prefix))
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
    }
}

impl From<BTreeMap<String, String>> for FieldMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<FieldMap> for BTreeMap<String, String> {
    fn from(fields: FieldMap) -> Self {
        fields
            .entries
            .into_iter()
            .map(|entry| (entry.name, entry.value))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// A ticket: a stable identifier plus an open set of string fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Ticket {
    pub fn new(id: TicketId) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name, value);
        self
    }
}

/// An immutable, id-sorted, duplicate-free set of tickets.
///
/// Cloning is cheap; every filtering generation holds its own clone, so the
/// tickets it evaluates cannot change underneath it.
#[derive(Debug, Clone, Default)]
pub struct TicketSnapshot {
    tickets: Arc<[Ticket]>,
}

impl TicketSnapshot {
    /// Builds a snapshot, sorting by id. For duplicate ids the last ticket wins.
    pub fn from_tickets(mut tickets: Vec<Ticket>) -> Self {
        tickets.sort_by_key(|ticket| ticket.id);
        let mut unique: Vec<Ticket> = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            match unique.last_mut() {
                Some(last) if last.id == ticket.id => *last = ticket,
                _ => unique.push(ticket),
            }
        }
        Self {
            tickets: unique.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Ticket> {
        self.tickets.get(index)
    }

    pub fn as_slice(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ticket> {
        self.tickets.iter()
    }

    /// Index of the ticket with the given id.
    pub fn position_of(&self, id: TicketId) -> Option<usize> {
        self.tickets
            .binary_search_by_key(&id, |ticket| ticket.id)
            .ok()
    }
}

impl From<Vec<Ticket>> for TicketSnapshot {
    fn from(tickets: Vec<Ticket>) -> Self {
        Self::from_tickets(tickets)
    }
}
