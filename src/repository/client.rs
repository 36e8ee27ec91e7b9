// src/repository/client.rs

//! HTTP client for repository operations
//!
//! Provides a wrapper around reqwest with retry support for fetching
//! index files and registry listings. Only transport failures are retried;
//! an HTTP error status is returned to the caller as-is.

use crate::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum attempts for a failed request
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Credentials attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    Anonymous,
    Basic {
        username: String,
        password: String,
    },
    Bearer(String),
}

impl Auth {
    /// Basic auth when both parts are present, anonymous otherwise
    pub fn from_credentials(username: Option<&str>, password: Option<&str>) -> Self {
        match (username, password) {
            (Some(u), Some(p)) => Auth::Basic {
                username: u.to_string(),
                password: p.to_string(),
            },
            _ => Auth::Anonymous,
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Anonymous => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }
}

/// HTTP client wrapper with retry support
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl RepositoryClient {
    /// Create a new repository client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::SourceError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// GET `url`, retrying transport failures
    pub fn get(&self, url: &str, auth: &Auth) -> Result<Response> {
        self.get_with_query(url, &[], auth)
    }

    /// GET `url` with query parameters, retrying transport failures
    pub fn get_with_query(&self, url: &str, query: &[(&str, &str)], auth: &Auth) -> Result<Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = auth.apply(self.client.get(url).query(query));
            match request.send() {
                Ok(response) => {
                    debug!("GET {} -> {}", url, response.status());
                    return Ok(response);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::SourceError(format!(
                            "Failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url, attempt, self.max_retries, e
                    );
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }

    /// GET `url` and return the body, failing on a non-success status
    pub fn fetch_text(&self, url: &str, auth: &Auth) -> Result<String> {
        let response = self.get(url, auth)?;
        if !response.status().is_success() {
            return Err(Error::SourceError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        response
            .text()
            .map_err(|e| Error::SourceError(format!("Failed to read response from {url}: {e}")))
    }
}
