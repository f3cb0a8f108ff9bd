//! Paginated search API client.
//!
//! One call to [`PageSource::fetch_page`] issues one request:
//!
//! ```text
//! POST {base_url}?q={keyword}&sortTypeId=1&cursor={cursor}
//! {"subscribers": {"type": "range", "from": 50, "to": 100000000}}
//! ```
//!
//! and returns the decoded items plus the cursor of the following page.
//! Errors are typed so the harvest loop can tell a 429 apart from other
//! failures.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ApiConfig, SubscriberRange};
use crate::models::{Page, PageBody};

/// Sort order requested from the search endpoint.
pub const SORT_TYPE_ID: u32 = 1;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limit exceeded (HTTP 429)")]
    RateLimited,

    #[error("search request failed (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("search request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed search page: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }
}

/// Anything that can return one page of search results for a keyword.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, keyword: &str, cursor: &str) -> Result<Page, FetchError>;
}

/// Build the request URL for one page.
///
/// The keyword is percent-encoded. The cursor is an opaque server token and
/// goes in verbatim, exactly as the API returned it. Reserved characters
/// such as `+`, `&` or `=` in a token are not escaped.
pub fn build_url(base_url: &str, keyword: &str, cursor: &str) -> String {
    format!(
        "{}?q={}&sortTypeId={}&cursor={}",
        base_url,
        urlencoding::encode(keyword),
        SORT_TYPE_ID,
        cursor
    )
}

/// Request body carrying the subscriber-count filter.
pub fn filter_body(range: &SubscriberRange) -> serde_json::Value {
    serde_json::json!({
        "subscribers": {
            "type": "range",
            "from": range.from,
            "to": range.to,
        }
    })
}

/// Decode a page body. A missing `list` is an error; a null or missing
/// `cursor` means there is no next page.
pub fn parse_page(body: &str) -> Result<Page, FetchError> {
    let body: PageBody = serde_json::from_str(body)?;
    Ok(body.into())
}

/// [`PageSource`] backed by the live HTTP endpoint.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    base_url: String,
    filter: serde_json::Value,
}

impl HttpPageFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('?').to_string(),
            filter: filter_body(&config.subscribers),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageFetcher {
    async fn fetch_page(&self, keyword: &str, cursor: &str) -> Result<Page, FetchError> {
        let url = build_url(&self.base_url, keyword, cursor);
        tracing::info!(%url, "requesting page");

        let resp = self.client.post(&url).json(&self.filter).send().await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let text = resp.text().await?;
        parse_page(&text)
    }
}
