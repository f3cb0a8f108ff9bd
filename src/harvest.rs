//! Resumable, keyword-by-keyword harvest loop.
//!
//! For each keyword:
//!
//! ```text
//! RESUMING ──▶ FETCHING ──▶ SAVING ──▶ FETCHING ──▶ ... ──▶ DONE
//!                 │
//!                 └──(error)──▶ ABORTED
//! ```
//!
//! 1. Load the stored cursor (absent = start of pagination).
//! 2. Fetch one page. An error aborts this keyword only; an empty page ends it.
//! 3. Save the page's contact-bearing channels, then advance the stored
//!    cursor. An empty next cursor ends the keyword without touching the
//!    stored cursor.
//! 4. Sleep a random [`Throttle`] delay and fetch the next page.
//!
//! Records are committed before the cursor moves, so a crash between the
//! two re-fetches a page on the next run instead of skipping one; the
//! store's dedup check absorbs the repeat.

use std::time::Duration;

use tracing::{info, warn};

use crate::fetcher::{FetchError, PageSource};
use crate::models::{ChannelRecord, Page};
use crate::store::{CursorStore, RecordStore};
use crate::throttle::Throttle;

/// Backoff applied to HTTP 429 responses before giving up on a keyword.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first 429. Zero aborts immediately.
    pub max_retries: u32,
    /// First backoff delay; doubles on every further attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn abort_on_rate_limit() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        // 1x, 2x, 4x, ... capped at 32x
        self.backoff * (1u32 << (attempt.saturating_sub(1)).min(5))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::abort_on_rate_limit()
    }
}

/// Why a keyword stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordEnd {
    /// The last page came back with an empty next cursor.
    Exhausted,
    /// A page came back with no items.
    EmptyPage,
    /// A fetch or storage error stopped the keyword.
    Aborted { reason: String },
}

#[derive(Debug, Clone)]
pub struct KeywordReport {
    pub keyword: String,
    pub pages: u64,
    pub fetched: u64,
    pub saved: u64,
    /// Cursor stored for the keyword when it stopped.
    pub cursor: String,
    pub end: KeywordEnd,
}

#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub keywords: Vec<KeywordReport>,
}

impl HarvestReport {
    pub fn total_saved(&self) -> u64 {
        self.keywords.iter().map(|k| k.saved).sum()
    }

    pub fn total_fetched(&self) -> u64 {
        self.keywords.iter().map(|k| k.fetched).sum()
    }

    pub fn aborted(&self) -> usize {
        self.keywords
            .iter()
            .filter(|k| matches!(k.end, KeywordEnd::Aborted { .. }))
            .count()
    }
}

pub struct Harvester<'a> {
    source: &'a dyn PageSource,
    cursors: &'a dyn CursorStore,
    records: &'a dyn RecordStore,
    throttle: Throttle,
    retry: RetryPolicy,
}

impl<'a> Harvester<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        cursors: &'a dyn CursorStore,
        records: &'a dyn RecordStore,
    ) -> Self {
        Self {
            source,
            cursors,
            records,
            throttle: Throttle::new(6, 25),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Harvest every keyword in order. Never fails: per-keyword errors are
    /// logged and recorded in the report.
    pub async fn run(&self, keywords: &[String]) -> HarvestReport {
        let mut report = HarvestReport::default();
        for keyword in keywords {
            report.keywords.push(self.harvest_keyword(keyword).await);
        }
        report
    }

    pub async fn harvest_keyword(&self, keyword: &str) -> KeywordReport {
        let mut report = KeywordReport {
            keyword: keyword.to_string(),
            pages: 0,
            fetched: 0,
            saved: 0,
            cursor: String::new(),
            end: KeywordEnd::Exhausted,
        };

        let mut cursor = match self.cursors.get_cursor(keyword).await {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                warn!(keyword, error = %e, "failed to load cursor, skipping keyword");
                report.end = KeywordEnd::Aborted {
                    reason: format!("cursor lookup failed: {:#}", e),
                };
                return report;
            }
        };
        report.cursor = cursor.clone();

        if cursor.is_empty() {
            info!(keyword, "starting harvest from the first page");
        } else {
            info!(keyword, cursor = %cursor, "resuming harvest");
        }

        loop {
            let page = match self.fetch_with_retry(keyword, &cursor).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(keyword, error = %e, "fetch failed, stopping keyword");
                    report.end = KeywordEnd::Aborted {
                        reason: e.to_string(),
                    };
                    break;
                }
            };
            report.pages += 1;

            if page.items.is_empty() {
                info!(keyword, "no more data available");
                report.end = KeywordEnd::EmptyPage;
                break;
            }

            let Page { items, next_cursor } = page;
            report.fetched += items.len() as u64;
            info!(keyword, items = items.len(), "fetched page");

            let candidates: Vec<ChannelRecord> = items
                .into_iter()
                .filter_map(|item| item.into_record(keyword))
                .collect();

            match self.records.add_batch(&candidates).await {
                Ok(inserted) => {
                    report.saved += inserted as u64;
                    info!(
                        keyword,
                        with_contacts = candidates.len(),
                        inserted,
                        "records saved"
                    );
                }
                Err(e) => {
                    warn!(keyword, error = %e, "failed to save records, stopping keyword");
                    report.end = KeywordEnd::Aborted {
                        reason: format!("save failed: {:#}", e),
                    };
                    break;
                }
            }

            if next_cursor.is_empty() {
                info!(keyword, "no more pages to fetch");
                report.end = KeywordEnd::Exhausted;
                break;
            }

            if let Err(e) = self.cursors.upsert_cursor(keyword, &next_cursor).await {
                warn!(keyword, error = %e, "failed to store cursor, stopping keyword");
                report.end = KeywordEnd::Aborted {
                    reason: format!("cursor update failed: {:#}", e),
                };
                break;
            }
            info!(keyword, cursor = %next_cursor, "cursor updated");
            cursor = next_cursor;
            report.cursor = cursor.clone();

            self.throttle.wait().await;
        }

        report
    }

    async fn fetch_with_retry(&self, keyword: &str, cursor: &str) -> Result<Page, FetchError> {
        let mut attempt = 0;
        loop {
            match self.source.fetch_page(keyword, cursor).await {
                Err(e) if e.is_rate_limited() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        keyword,
                        attempt,
                        max = self.retry.max_retries,
                        "rate limited, backing off {}s",
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
