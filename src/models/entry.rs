//! Parsed bibliographic entries and the per-search result set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A parsed bibliographic record
///
/// Field names are lowercase; values are plain text with BibTeX markup
/// flattened by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Citation key (e.g. `Smith2001`)
    pub key: String,

    /// Entry type (e.g. `article`, `book`)
    pub entry_type: String,

    /// Field values keyed by lowercase field name
    pub fields: BTreeMap<String, String>,
}

impl Entry {
    /// Create an entry without fields
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field, lowercasing its name
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_lowercase(), value.into());
        self
    }

    /// Look up a field by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author")
    }

    pub fn year(&self) -> Option<&str> {
        self.get("year")
    }

    /// Render the entry back to BibTeX
    pub fn to_bibtex(&self) -> String {
        let mut out = format!("@{}{{{}", self.entry_type, self.key);
        for (name, value) in &self.fields {
            out.push_str(&format!(",\n  {} = {{{}}}", name, value));
        }
        out.push_str("\n}");
        out
    }
}

/// Entries produced by one search, deduplicated by entry equality
///
/// Iteration follows first-insertion order so output is stable, but callers
/// must not rely on any particular ordering of search results.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: Vec<Entry>,
    seen: HashSet<Entry>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; returns false if an equal entry is already present
    pub fn insert(&mut self, entry: Entry) -> bool {
        if self.seen.contains(&entry) {
            return false;
        }
        self.seen.insert(entry.clone());
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

}

impl IntoIterator for ResultSet {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
