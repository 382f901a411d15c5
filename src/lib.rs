//! # zbMATH Search
//!
//! A search client for the Zentralblatt MATH (zbMATH) bibliographic database.
//! A keyword search is posted to the remote service, the record links on the
//! returned listing are scraped, every record is fetched as BibTeX, and the
//! parsed entries are delivered to a host application.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Query, RecordId, Entry, ResultSet)
//! - [`sources`]: Transport trait, the HTTP transport and listing scraper
//! - [`parser`]: BibTeX parsing behind the [`parser::EntryParser`] trait
//! - [`search`]: The search orchestrator and host-facing sinks
//! - [`utils`]: HTTP client, retry and umlaut normalization
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal host used by the command-line client

pub mod config;
pub mod models;
pub mod parser;
pub mod search;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Entry, Query, Refinements};
pub use search::ZentralSearch;
pub use sources::{SourceError, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
