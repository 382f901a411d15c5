//! Remote data source for zbMATH searches.
//!
//! This module defines the [`Transport`] trait through which the search
//! pipeline talks to the remote service, and [`SourceError`], the error type
//! shared by every pipeline stage.
//!
//! [`HttpTransport`] is the production implementation. [`MockTransport`]
//! serves scripted responses from memory and counts calls, which makes it
//! useful for exercising the pipeline without network access.
//!
//! # Remote protocol
//!
//! - The listing is requested with a form-encoded POST to the base URL.
//! - Each record is requested with `GET <base>?index_=<id>&type_=bib`.
//! - Record identifiers are scraped from listing anchors of the shape
//!   `href="?index_=<id>&amp;type_=...` (see [`extract_index_ids`]).

pub mod mock;
mod zentralblatt;

pub use mock::MockTransport;
pub use zentralblatt::{extract_index_ids, HttpTransport, DEFAULT_BASE_URL};

use crate::models::RecordId;
use async_trait::async_trait;

/// The Transport trait issues the two kinds of requests the search needs.
///
/// Implementations return response bodies as text decoded from UTF-8. A
/// failing [`Transport::get_record`] only loses that one record; the caller
/// decides how to recover.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Base URL requests are sent to (used in user-facing messages)
    fn base_url(&self) -> &str;

    /// POST the form-encoded query and return the listing page
    async fn post_listing(&self, body: &str) -> Result<String, SourceError>;

    /// GET the BibTeX representation of one record
    async fn get_record(&self, id: &RecordId) -> Result<String, SourceError>;
}

/// Errors that can occur while searching zbMATH
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The search keyword was empty or whitespace-only
    #[error("Search keyword is blank")]
    BlankKeyword,

    /// Network error (connection, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The listing page contained no record links
    #[error("No resulting docs received.")]
    NoResults,

    /// BibTeX parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Records were fetched but none produced an entry
    #[error("Nothing found! Try a different search.")]
    EmptyResult,

    /// The host asked the search to stop
    #[error("Search cancelled")]
    Cancelled,

    /// Invalid request parameters or configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
