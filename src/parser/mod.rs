//! BibTeX parsing.
//!
//! The search pipeline only needs `parse(text) -> entries`; [`EntryParser`]
//! is that seam. [`BiblatexParser`] implements it with the `biblatex` crate.

use crate::models::Entry;
use crate::sources::SourceError;

/// Turns one BibTeX text into zero or more entries
pub trait EntryParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, text: &str) -> Result<Vec<Entry>, SourceError>;
}

/// Parser backed by `biblatex::Bibliography`
#[derive(Debug, Clone, Copy, Default)]
pub struct BiblatexParser;

impl BiblatexParser {
    pub fn new() -> Self {
        Self
    }
}

impl EntryParser for BiblatexParser {
    fn parse(&self, text: &str) -> Result<Vec<Entry>, SourceError> {
        let bibliography = biblatex::Bibliography::parse(text)
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(bibliography.iter().map(convert_entry).collect())
    }
}

fn convert_entry(entry: &biblatex::Entry) -> Entry {
    let fields = entry
        .fields
        .iter()
        .map(|(name, chunks)| (name.to_lowercase(), chunks_to_string(chunks)))
        .collect();

    Entry {
        key: entry.key.clone(),
        entry_type: entry.entry_type.to_string().to_lowercase(),
        fields,
    }
}

/// Flatten biblatex chunks to plain text
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.clone(),
            biblatex::Chunk::Verbatim(s) => s.clone(),
            biblatex::Chunk::Math(s) => format!("${}$", s),
        })
        .collect()
}
