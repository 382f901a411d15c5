//! Search query model and form-body construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

use crate::sources::SourceError;

/// Returns true for empty or whitespace-only text
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Optional refinements that narrow a keyword search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refinements {
    /// Author filter (`au`)
    pub author: Option<String>,

    /// Title filter (`ti`)
    pub title: Option<String>,

    /// Abstract filter (`ab`)
    pub abstract_text: Option<String>,
}

impl Refinements {
    /// Create empty refinements
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to an author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Restrict results to a title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Search within abstracts
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }
}

/// A validated search query
///
/// The keyword is guaranteed to be non-blank. Refinements are kept as given;
/// blank ones are simply left out of the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    keyword: String,
    refinements: Refinements,
}

impl Query {
    /// Build a query, rejecting a blank keyword before any I/O happens
    pub fn new(keyword: impl Into<String>, refinements: Refinements) -> Result<Self, SourceError> {
        let keyword = keyword.into();
        if is_blank(&keyword) {
            return Err(SourceError::BlankKeyword);
        }
        Ok(Self {
            keyword,
            refinements,
        })
    }

    /// The free-text keyword
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The optional refinements
    pub fn refinements(&self) -> &Refinements {
        &self.refinements
    }

    /// Encode the query as an `application/x-www-form-urlencoded` body.
    ///
    /// Fields appear in the order `any`, `au`, `ti`, `ab`, and only when
    /// their value is non-blank.
    pub fn form_body(&self) -> String {
        let fields = [
            ("any", Some(self.keyword.as_str())),
            ("au", self.refinements.author.as_deref()),
            ("ti", self.refinements.title.as_deref()),
            ("ab", self.refinements.abstract_text.as_deref()),
        ];

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in fields {
            if let Some(value) = value.filter(|v| !is_blank(v)) {
                serializer.append_pair(name, value);
            }
        }
        serializer.finish()
    }
}

/// Opaque identifier of one record in the zbMATH index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
