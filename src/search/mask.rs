//! Inclusion masks and the row filter handed to the view.

use std::sync::Arc;

const WORD_BITS: usize = u64::BITS as usize;

/// One bit per ticket index, set when the ticket satisfies every term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionMask {
    words: Vec<u64>,
    len: usize,
}

impl InclusionMask {
    /// Creates an all-clear mask for `len` tickets.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Marks `index` as included. Out-of-range indices are ignored.
    pub fn insert(&mut self, index: usize) {
        if index < self.len {
            self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.len && self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Number of included tickets.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Iterates included indices in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_index, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(word_index * WORD_BITS + bit)
                })
            })
    }

    /// Copies a batch mask into this mask at `offset`.
    ///
    /// Batches cover disjoint ranges, so merges commute.
    pub fn merge_at(&mut self, offset: usize, batch: &InclusionMask) {
        for local in batch.iter_ones() {
            self.insert(offset + local);
        }
    }
}

/// Row visibility published for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    /// The query has no terms; every row is visible.
    IncludeAll,
    /// Frozen mask of the generation, indexed by snapshot position.
    Matching(Arc<InclusionMask>),
}

impl RowFilter {
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Self::IncludeAll => true,
            Self::Matching(mask) => mask.contains(index),
        }
    }

    pub fn is_include_all(&self) -> bool {
        matches!(self, Self::IncludeAll)
    }

    /// Number of visible rows, `None` when everything is visible.
    pub fn matched_count(&self) -> Option<usize> {
        match self {
            Self::IncludeAll => None,
            Self::Matching(mask) => Some(mask.count_ones()),
        }
    }

    pub fn mask(&self) -> Option<&InclusionMask> {
        match self {
            Self::IncludeAll => None,
            Self::Matching(mask) => Some(mask),
        }
    }
}
