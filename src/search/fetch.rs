//! Per-record BibTeX retrieval.

use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::models::RecordId;
use crate::sources::{SourceError, Transport};

#[derive(Debug, Default)]
struct StopState {
    stopped: AtomicBool,
    notify: Notify,
}

/// Stop token for one search run.
///
/// Clones share the token. Once raised it stays raised; every search gets
/// a token of its own.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<StopState>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the search holding this token to stop
    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once the token is raised
    pub async fn stopped(&self) {
        loop {
            let notified = self.0.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }

    /// Whether both handles refer to the same token
    pub fn same_token(&self, other: &StopSignal) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Fetches the BibTeX text of every record id.
///
/// A failing record is logged and skipped so one flaky record cannot sink
/// an otherwise successful search.
#[derive(Debug)]
pub struct RecordFetcher<'a> {
    transport: &'a dyn Transport,
    concurrency: usize,
    stop: Option<&'a StopSignal>,
}

impl<'a> RecordFetcher<'a> {
    /// Sequential fetcher without a stop signal
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            concurrency: 1,
            stop: None,
        }
    }

    /// Number of record requests allowed in flight at once
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Check `stop` before every record request
    pub fn stop_signal(mut self, stop: &'a StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stopped(&self) -> bool {
        self.stop.is_some_and(StopSignal::is_stopped)
    }

    /// Fetch all records; the result holds each distinct text once.
    ///
    /// Returns [`SourceError::Cancelled`] if the stop signal was raised.
    pub async fn fetch_all(&self, ids: HashSet<RecordId>) -> Result<HashSet<String>, SourceError> {
        let total = ids.len();

        let texts: Vec<Option<String>> = stream::iter(ids)
            .map(|id| async move {
                if self.stopped() {
                    return None;
                }
                match self.transport.get_record(&id).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        tracing::warn!("Skipping record {}: {}", id, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if self.stopped() {
            tracing::info!("Record fetching cancelled");
            return Err(SourceError::Cancelled);
        }

        let texts: HashSet<String> = texts.into_iter().flatten().collect();
        tracing::debug!("Fetched {} of {} records", texts.len(), total);
        Ok(texts)
    }
}
