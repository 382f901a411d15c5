//! Utility modules supporting the search pipeline.
//!
//! - [`HttpClient`]: reqwest client configured for zbMATH (user agent, timeouts, no pooling)
//! - [`normalize_umlauts`]: rewrite `\"a`-style umlaut escapes to precomposed characters
//! - [`RetryConfig`]: configuration for retry logic with exponential backoff
//! - [`with_retry`]: execute an operation with automatic retry on transient errors
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use zbmath_search::sources::SourceError;
//! use zbmath_search::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_page() -> Result<String, SourceError> { Ok("page".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::default().max_retries(3);
//! let page = with_retry(config, || fetch_page()).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod normalize;
mod retry;

pub use http::HttpClient;
pub use normalize::normalize_umlauts;
pub use retry::{with_retry, RetryConfig, TransientError};
