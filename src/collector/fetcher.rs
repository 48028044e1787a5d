//! HTTP fetcher implementation
//!
//! This module handles all requests to the search API, including:
//! - Building the HTTP client with the configured timeout
//! - Issuing one paginated search query per call
//! - Classifying the outcome for the retry policy

use crate::collector::retry::OutcomeClass;
use crate::config::{ApiConfig, PacingConfig};
use crate::record::SearchPage;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of a single search request
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched and decoded a page
    Page(SearchPage),

    /// The request timed out
    Timeout,

    /// Connection or transport failure
    Network {
        /// Error description
        error: String,
    },

    /// HTTP 429 from the API
    RateLimited,

    /// Any other non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// Start of the response body, for diagnostics
        body: String,
    },

    /// The response body was not a search page
    Malformed {
        /// Decoding error description
        error: String,
    },

    /// The request could not be built (bad header value, bad URL)
    InvalidRequest {
        /// Error description
        error: String,
    },
}

impl FetchOutcome {
    /// Classifies the outcome for the retry policy
    pub fn class(&self) -> OutcomeClass {
        match self {
            Self::Page(_) => OutcomeClass::Success,
            Self::Timeout | Self::Network { .. } | Self::RateLimited => OutcomeClass::Transient,
            Self::HttpError { .. } | Self::Malformed { .. } | Self::InvalidRequest { .. } => {
                OutcomeClass::Fatal
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `pacing` - Pacing configuration carrying the request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(pacing: &PacingConfig) -> Result<Client, reqwest::Error> {
    let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(pacing.request_timeout())
        .connect_timeout(pacing.request_timeout().min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Client for the advanced search endpoint
pub struct SearchClient {
    client: Client,
    endpoint: String,
    key_header: String,
    api_key: String,
    query_type: String,
}

impl SearchClient {
    /// Creates a search client
    ///
    /// # Arguments
    ///
    /// * `api` - Endpoint, key header and query type
    /// * `pacing` - Pacing configuration (request timeout)
    /// * `api_key` - Credential sent in the key header
    pub fn new(api: &ApiConfig, pacing: &PacingConfig, api_key: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(pacing)?,
            endpoint: api.endpoint.clone(),
            key_header: api.key_header.clone(),
            api_key,
            query_type: api.query_type.clone(),
        })
    }

    /// Fetches one page of results for `query`, starting at `cursor`
    ///
    /// An empty cursor requests the first page. This never returns an error:
    /// every failure mode is reported as a `FetchOutcome` so the caller can
    /// apply its retry policy.
    pub async fn fetch_page(&self, query: &str, cursor: &str) -> FetchOutcome {
        let request = self
            .client
            .get(&self.endpoint)
            .header(self.key_header.as_str(), self.api_key.as_str())
            .query(&[
                ("query", query),
                ("queryType", self.query_type.as_str()),
                ("cursor", cursor),
            ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(e),
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::RateLimited;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return FetchOutcome::HttpError {
                status_code: status.as_u16(),
                body: body.chars().take(200).collect(),
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return classify_transport_error(e),
        };

        match serde_json::from_str::<SearchPage>(&body) {
            Ok(page) => FetchOutcome::Page(page),
            Err(e) => FetchOutcome::Malformed {
                error: e.to_string(),
            },
        }
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_builder() {
        FetchOutcome::InvalidRequest {
            error: e.to_string(),
        }
    } else {
        FetchOutcome::Network {
            error: e.to_string(),
        }
    }
}
