use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const USER_AGENT: &str = "site-change-watcher/1.0";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// Source of page bodies for the watch loop.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body decoded as text.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

pub fn create_client(user_agent: &str, timeout: Duration) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    let client = ClientBuilder::new()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .pool_max_idle_per_host(1)
        .build()?;

    Ok(client)
}

/// Plain GET fetcher. One attempt per call; the poll interval is the only
/// retry policy.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(USER_AGENT, timeout)
    }

    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: create_client(user_agent, timeout)?,
            timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error {}: {}", status, url);
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        // Decodes using the charset from Content-Type, UTF-8 otherwise,
        // replacing invalid sequences.
        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
