// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Client for the ZenQuotes service.

use std::time::Duration;

use async_trait::async_trait;
use common::ZenQuote;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors raised while fetching quotes. The `Display` text is what the UI
/// shows when a fetch fails.
#[derive(Debug, Error)]
pub enum QuotesApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Quote service responded with status {0}")]
    Status(u16),

    #[error("Quote service returned no quotes")]
    Empty,

    #[error("Quote service returned a blank quote")]
    Blank,
}

pub type QuotesApiResult<T> = Result<T, QuotesApiError>;

/// Anything able to produce a batch of quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self) -> QuotesApiResult<Vec<ZenQuote>>;
}

/// HTTP client for the `quotes/` endpoint.
#[derive(Clone, Debug)]
pub struct ZenQuotesClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ZenQuotesClient {
    /// Builds a client for `base_url` (e.g. `https://zenquotes.io/api/`).
    /// Requests that take longer than `timeout` fail.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> QuotesApiResult<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    fn quotes_url(&self) -> String {
        format!("{}/quotes/", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl QuoteSource for ZenQuotesClient {
    async fn fetch_quotes(&self) -> QuotesApiResult<Vec<ZenQuote>> {
        let url = self.quotes_url();
        debug!("Fetching quotes from {}", url);

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            error!(status, "Quote service error");
            return Err(QuotesApiError::Status(status));
        }

        let quotes: Vec<ZenQuote> = response.json().await?;
        info!("Fetched {} quotes.", quotes.len());
        Ok(quotes)
    }
}
