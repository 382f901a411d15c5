//! Mock transport for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::RecordId;
use crate::search::StopSignal;
use crate::sources::{SourceError, Transport};

const MOCK_BASE_URL: &str = "http://mock.invalid/zbmath/search/";

/// A transport that serves predefined responses and records every call.
#[derive(Debug, Default)]
pub struct MockTransport {
    listing: Option<Result<String, SourceError>>,
    records: HashMap<RecordId, Result<String, SourceError>>,
    stop_on_get: Option<StopSignal>,
    post_calls: AtomicUsize,
    get_calls: AtomicUsize,
    bodies: Mutex<Vec<String>>,
    requested: Mutex<Vec<RecordId>>,
}

impl MockTransport {
    /// Create a mock without any configured responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listing page returned by the POST.
    pub fn with_listing(mut self, page: impl Into<String>) -> Self {
        self.listing = Some(Ok(page.into()));
        self
    }

    /// Make the POST fail.
    pub fn with_listing_error(mut self, error: SourceError) -> Self {
        self.listing = Some(Err(error));
        self
    }

    /// Set the BibTeX text returned for a record.
    pub fn with_record(mut self, id: &str, text: impl Into<String>) -> Self {
        self.records.insert(RecordId::new(id), Ok(text.into()));
        self
    }

    /// Make the GET for a record fail.
    pub fn with_record_error(mut self, id: &str, error: SourceError) -> Self {
        self.records.insert(RecordId::new(id), Err(error));
        self
    }

    /// Raise `signal` whenever a record is requested.
    pub fn stop_on_get(mut self, signal: StopSignal) -> Self {
        self.stop_on_get = Some(signal);
        self
    }

    /// Number of listing requests issued.
    pub fn post_count(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    /// Number of record requests issued.
    pub fn get_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Total number of requests issued.
    pub fn request_count(&self) -> usize {
        self.post_count() + self.get_count()
    }

    /// Bodies sent with listing requests, in order.
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Record ids requested, in order.
    pub fn requested_ids(&self) -> Vec<RecordId> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn base_url(&self) -> &str {
        MOCK_BASE_URL
    }

    async fn post_listing(&self, body: &str) -> Result<String, SourceError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut bodies) = self.bodies.lock() {
            bodies.push(body.to_string());
        }

        self.listing
            .clone()
            .unwrap_or_else(|| Err(SourceError::Network("no listing configured".to_string())))
    }

    async fn get_record(&self, id: &RecordId) -> Result<String, SourceError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(id.clone());
        }
        if let Some(signal) = &self.stop_on_get {
            signal.stop();
        }

        self.records.get(id).cloned().unwrap_or_else(|| {
            Err(SourceError::Http {
                status: 404,
                url: format!("{}?index_={}&type_=bib", MOCK_BASE_URL, id),
            })
        })
    }
}
