//! Zentralblatt MATH (zbMATH) transport implementation.
//!
//! zbMATH has no public API for this search, so the listing page is scraped
//! for record links and every record is fetched in its BibTeX export form.

use async_trait::async_trait;
use reqwest::header::{ACCEPT_CHARSET, CONTENT_TYPE};
use std::collections::HashSet;

use crate::config::{EndpointConfig, HttpConfig};
use crate::models::RecordId;
use crate::sources::{SourceError, Transport};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Search endpoint of the classic Zentralblatt MATH interface
pub const DEFAULT_BASE_URL: &str = "http://www.zentralblatt-math.org/zbmath/search/";

const CHARSET: &str = "UTF-8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

const INDEX_OPEN: &str = "href=\"?index_=";
const INDEX_CLOSE: &str = "&amp;type_=";

/// Scan a listing page for record identifiers.
///
/// Every substring between `href="?index_=` and the next `&amp;type_=` is an
/// id, scanned left to right without overlap. Duplicates collapse; empty
/// substrings are ignored. A page without any id yields
/// [`SourceError::NoResults`].
pub fn extract_index_ids(page: &str) -> Result<HashSet<RecordId>, SourceError> {
    let mut ids = HashSet::new();
    let mut rest = page;

    while let Some(start) = rest.find(INDEX_OPEN) {
        let after_open = &rest[start + INDEX_OPEN.len()..];
        let Some(end) = after_open.find(INDEX_CLOSE) else {
            break;
        };

        let id = &after_open[..end];
        if !id.is_empty() {
            ids.insert(RecordId::new(id));
        }
        rest = &after_open[end + INDEX_CLOSE.len()..];
    }

    if ids.is_empty() {
        return Err(SourceError::NoResults);
    }
    Ok(ids)
}

/// HTTP transport talking to the zbMATH search endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Create a transport for the default endpoint with default HTTP settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&EndpointConfig::default(), &HttpConfig::default())
    }

    /// Create a transport from endpoint and HTTP configuration
    pub fn from_config(endpoint: &EndpointConfig, http: &HttpConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(http)?,
            base_url: endpoint.base_url.clone(),
            retry: RetryConfig::default().max_retries(http.max_retries),
        })
    }

    /// Override the retry policy
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Ids are scraped from `href` attributes and already URL-safe, so they
    /// are sent as they appeared on the listing.
    fn record_url(&self, id: &RecordId) -> String {
        format!("{}?index_={}&type_=bib", self.base_url, id.as_str())
    }
}

/// Check the status and decode the body as UTF-8
async fn read_text(response: reqwest::Response) -> Result<String, SourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Http {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SourceError::Network(format!("Failed to read response body: {}", e)))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_listing(&self, body: &str) -> Result<String, SourceError> {
        tracing::debug!("Zentralblatt URL: {}", self.base_url);

        with_retry(self.retry, || async move {
            let response = self
                .client
                .client()
                .post(&self.base_url)
                .header(ACCEPT_CHARSET, CHARSET)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.as_bytes().to_vec())
                .send()
                .await
                .map_err(|e| SourceError::Network(format!("Failed to query zbMATH: {}", e)))?;

            read_text(response).await
        })
        .await
    }

    async fn get_record(&self, id: &RecordId) -> Result<String, SourceError> {
        let url = self.record_url(id);
        tracing::debug!("Fetching record {} from {}", id, url);

        with_retry(self.retry, || {
            let url = url.as_str();
            async move {
                let response = self
                    .client
                    .client()
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", url, e)))?;

                read_text(response).await
            }
        })
        .await
    }
}
