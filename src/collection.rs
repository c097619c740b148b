//! What a source hands to the engine: raw candidate strings, each with
//! optional scope tags.

use crate::literal::is_private;
use crate::scope::{Dimension, ScopeTag};

/// One raw candidate and its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub raw: String,
    pub tags: Vec<ScopeTag>,
}

/// The flat sequence a source produces for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an untagged candidate.
    pub fn push(&mut self, raw: impl Into<String>) {
        self.entries.push(Entry {
            raw: raw.into(),
            tags: Vec::new(),
        });
    }

    /// Add a candidate with its tags.
    pub fn push_tagged<I>(&mut self, raw: impl Into<String>, tags: I)
    where
        I: IntoIterator<Item = ScopeTag>,
    {
        self.entries.push(Entry {
            raw: raw.into(),
            tags: tags.into_iter().collect(),
        });
    }

    /// Shorthand for a candidate tagged in a single dimension.
    pub fn push_scoped(&mut self, raw: impl Into<String>, dimension: Dimension, key: impl Into<String>) {
        self.push_tagged(raw, [ScopeTag::new(dimension, key)]);
    }

    pub fn extend(&mut self, other: Collection) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn raw_values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.raw.as_str())
    }

    /// `(raw, tags)` pairs as consumed by the partitioner.
    pub fn tagged(&self) -> impl Iterator<Item = (&str, &[ScopeTag])> {
        self.entries
            .iter()
            .map(|e| (e.raw.as_str(), e.tags.as_slice()))
    }

    /// Drop candidates inside RFC 1918 / RFC 4193 space. Returns how many
    /// were removed.
    pub fn retain_public(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !is_private(&e.raw));
        before - self.entries.len()
    }
}

impl<S: Into<String>> FromIterator<S> for Collection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut collection = Collection::new();
        for raw in iter {
            collection.push(raw);
        }
        collection
    }
}
