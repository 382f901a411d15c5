//! Search orchestration.
//!
//! [`ZentralSearch`] runs one search as a single forward pass:
//!
//! ```text
//! Querying -> Listing -> Fetching -> Aggregating -> Delivering -> Done
//! ```
//!
//! Any stage may end the search early. Failures are turned into one message
//! for the host and a `false` return; entries are delivered only when the
//! whole pipeline succeeded.
//!
//! Each run owns a [`StopSignal`]. Raising it ends the run at the next
//! stage boundary, and also abandons an in-flight listing or record request.
//!
//! # Example
//!
//! ```rust,no_run
//! use zbmath_search::models::Refinements;
//! use zbmath_search::search::{RecordingHost, ZentralSearch};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let search = ZentralSearch::new()?;
//! let host = RecordingHost::new();
//!
//! let refinements = Refinements::new().author("Gauß");
//! if search.search("number theory", &refinements, &host, &host).await {
//!     for entry in host.entries() {
//!         println!("{}", entry.to_bibtex());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod fetch;
mod host;

pub use aggregate::aggregate;
pub use fetch::{RecordFetcher, StopSignal};
pub use host::{ProgressSink, RecordingHost, ResultSink, Severity};

use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use crate::config::{Config, EndpointConfig};
use crate::models::{Query, Refinements, ResultSet};
use crate::parser::{BiblatexParser, EntryParser};
use crate::sources::{extract_index_ids, HttpTransport, SourceError, Transport};

/// Name under which hosts list this fetcher
pub const KEY_NAME: &str = "Search Zentralblatt MATH";

/// Searches Zentralblatt MATH and delivers BibTeX entries to a host
#[derive(Debug)]
pub struct ZentralSearch {
    transport: Arc<dyn Transport>,
    parser: Arc<dyn EntryParser>,
    endpoint: EndpointConfig,
    max_concurrent_requests: usize,
    active: Mutex<Vec<StopSignal>>,
}

/// Keeps a run's stop token registered while the run is in progress
struct ActiveRun<'a> {
    active: &'a Mutex<Vec<StopSignal>>,
    stop: StopSignal,
}

impl<'a> ActiveRun<'a> {
    fn register(active: &'a Mutex<Vec<StopSignal>>, stop: &StopSignal) -> Self {
        if let Ok(mut runs) = active.lock() {
            runs.push(stop.clone());
        }
        Self {
            active,
            stop: stop.clone(),
        }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if let Ok(mut runs) = self.active.lock() {
            runs.retain(|s| !s.same_token(&self.stop));
        }
    }
}

impl ZentralSearch {
    /// Search the default endpoint over HTTP
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Build an HTTP-backed search from configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let transport = HttpTransport::from_config(&config.endpoint, &config.http)?;

        Ok(
            Self::with_transport(Arc::new(transport), Arc::new(BiblatexParser::new()))
                .endpoint(config.endpoint.clone())
                .max_concurrent_requests(config.fetch.max_concurrent_requests),
        )
    }

    /// Build a search around any transport and parser
    pub fn with_transport(transport: Arc<dyn Transport>, parser: Arc<dyn EntryParser>) -> Self {
        let endpoint = EndpointConfig {
            base_url: transport.base_url().to_string(),
            ..EndpointConfig::default()
        };
        Self {
            transport,
            parser,
            endpoint,
            max_concurrent_requests: 1,
            active: Mutex::new(Vec::new()),
        }
    }

    /// Set the help and icon URLs reported to hosts
    pub fn endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Fetch up to `n` records at once
    pub fn max_concurrent_requests(mut self, n: usize) -> Self {
        self.max_concurrent_requests = n.max(1);
        self
    }

    pub fn help_page(&self) -> &str {
        &self.endpoint.help_url
    }

    pub fn icon_url(&self) -> &str {
        &self.endpoint.icon_url
    }

    pub fn key_name(&self) -> &str {
        KEY_NAME
    }

    pub fn title(&self) -> &str {
        KEY_NAME
    }

    /// The URL searches are sent to
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Stop every search currently running on this instance.
    ///
    /// Searches started afterwards are not affected.
    pub fn stop_fetching(&self) {
        if let Ok(runs) = self.active.lock() {
            for stop in runs.iter() {
                stop.stop();
            }
        }
    }

    /// Run a search and hand its entries to `results`.
    ///
    /// Returns `true` when the pipeline ran to completion, which implies at
    /// least one entry was delivered. On failure the host gets exactly one
    /// message (or a status line when cancelled) and no entries.
    pub async fn search(
        &self,
        keyword: &str,
        refinements: &Refinements,
        progress: &dyn ProgressSink,
        results: &dyn ResultSink,
    ) -> bool {
        self.search_until(keyword, refinements, progress, results, &StopSignal::new())
            .await
    }

    /// Like [`ZentralSearch::search`], stopped by the caller's own token.
    ///
    /// [`ZentralSearch::stop_fetching`] raises `stop` too while this run is
    /// in progress. A token that is already raised cancels the run before
    /// any request is made.
    pub async fn search_until(
        &self,
        keyword: &str,
        refinements: &Refinements,
        progress: &dyn ProgressSink,
        results: &dyn ResultSink,
        stop: &StopSignal,
    ) -> bool {
        progress.set_status(&format!("Searching for {}", keyword));

        let outcome = {
            let _run = ActiveRun::register(&self.active, stop);
            AssertUnwindSafe(self.run(keyword, refinements, stop))
                .catch_unwind()
                .await
        };

        let entries = match outcome {
            Ok(Ok(entries)) => entries,
            Ok(Err(error)) => {
                tracing::debug!(state = "failed", "Search for '{}' failed: {}", keyword, error);
                self.report_failure(&error, progress);
                return false;
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!("General problem while searching for '{}': {}", keyword, reason);
                progress.show_message(
                    &format!("Error while fetching from Zentralblatt MATH: {}", reason),
                    Severity::Error,
                );
                return false;
            }
        };

        tracing::debug!(state = "delivering", "Delivering {} entries", entries.len());
        let total = entries.len();
        progress.set_status(&format!("Adding fetched entries: {}", total));
        for (i, entry) in entries.into_iter().enumerate() {
            progress.set_progress(i + 1, total);
            results.add_entry(entry);
        }

        tracing::debug!(state = "done", "Search for '{}' complete", keyword);
        true
    }

    async fn run(
        &self,
        keyword: &str,
        refinements: &Refinements,
        stop: &StopSignal,
    ) -> Result<ResultSet, SourceError> {
        tracing::debug!(state = "querying", "Building query for '{}'", keyword);
        let query = Query::new(keyword, refinements.clone()).inspect_err(|_| {
            tracing::error!("Search entry was empty.");
        })?;
        let body = query.form_body();

        tracing::debug!(state = "listing", "Posting query to {}", self.base_url());
        let page = until_stopped(stop, async {
            self.transport
                .post_listing(&body)
                .await
                .inspect_err(|e| tracing::error!("IO problem: {}", e))
        })
        .await?;

        let ids = extract_index_ids(&page)?;

        tracing::debug!(state = "fetching", "Fetching {} records", ids.len());
        let fetcher = RecordFetcher::new(self.transport.as_ref())
            .concurrency(self.max_concurrent_requests)
            .stop_signal(stop);
        let texts = until_stopped(stop, fetcher.fetch_all(ids)).await?;

        tracing::debug!(state = "aggregating", "Parsing {} records", texts.len());
        let entries = aggregate(texts, self.parser.as_ref())?;

        if stop.is_stopped() {
            return Err(SourceError::Cancelled);
        }
        Ok(entries)
    }

    fn report_failure(&self, error: &SourceError, progress: &dyn ProgressSink) {
        match failure_message(error, self.base_url()) {
            Some((message, severity)) => progress.show_message(&message, severity),
            None => progress.set_status("Search cancelled"),
        }
    }
}

/// The message shown for a failed search, or `None` for a cancelled one
pub fn failure_message(error: &SourceError, base_url: &str) -> Option<(String, Severity)> {
    match error {
        SourceError::Cancelled => None,
        SourceError::BlankKeyword => Some((
            "Please select or enter keyword".to_string(),
            Severity::Info,
        )),
        SourceError::Network(_) | SourceError::Http { .. } => Some((
            format!(
                "An exception occurred while accessing '{}'\n\n{}",
                base_url, error
            ),
            Severity::Error,
        )),
        _ => Some((
            format!(
                "An error occurred while fetching from Mathematisches Zentralblatt ({}):\n\n{}",
                base_url, error
            ),
            Severity::Error,
        )),
    }
}

/// Run `operation` unless `stop` is raised first
async fn until_stopped<T, F>(stop: &StopSignal, operation: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    tokio::select! {
        biased;
        _ = stop.stopped() => Err(SourceError::Cancelled),
        result = operation => result,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}
