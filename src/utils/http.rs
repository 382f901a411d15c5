//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client with the settings zbMATH requests need
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a client from configuration.
    ///
    /// Idle connections are not kept, so each connection lives only as long
    /// as the request that opened it.
    pub fn from_config(config: &HttpConfig) -> Result<Self, SourceError> {
        if config.timeout_secs == 0 {
            return Err(SourceError::InvalidRequest(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
