//! Core data models for zbMATH searches and their bibliographic results.

mod entry;
mod query;

pub use entry::{Entry, ResultSet};
pub use query::{is_blank, Query, RecordId, Refinements};
