//! Storage abstraction for the harvester.
//!
//! [`CursorStore`] owns per-keyword pagination state and [`RecordStore`]
//! owns the deduplicated channel set. The harvest loop only talks to these
//! traits, so it runs the same against SQLite ([`sqlite`]) and the
//! in-memory backend ([`memory`]) used in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChannelRecord, CursorRecord, StoredChannel};

pub use memory::{InMemoryCursorStore, InMemoryRecordStore};
pub use sqlite::SqliteStore;

/// Durable keyword → cursor mapping.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_cursor`](CursorStore::get_cursor) | Last saved cursor for a keyword |
/// | [`upsert_cursor`](CursorStore::upsert_cursor) | Insert or overwrite the cursor in place |
/// | [`list_cursors`](CursorStore::list_cursors) | All stored cursors, by keyword |
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Returns `None` when the keyword has never had a page saved.
    async fn get_cursor(&self, keyword: &str) -> Result<Option<String>>;

    /// Insert-if-absent-else-update. Leaves exactly one row per keyword.
    async fn upsert_cursor(&self, keyword: &str, cursor: &str) -> Result<()>;

    async fn list_cursors(&self) -> Result<Vec<CursorRecord>>;
}

/// Durable set of harvested channels, deduplicated on (name, email).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert the records whose (name, email) pair is not already stored.
    ///
    /// Existing rows are looked up by the distinct emails of the batch
    /// (a missing email counts as its own value). Incoming records are not
    /// compared with each other, so a batch carrying the same pair twice
    /// inserts it twice. Returns the number of rows inserted.
    async fn add_batch(&self, records: &[ChannelRecord]) -> Result<usize>;

    async fn count(&self) -> Result<i64>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// All stored records in insertion order.
    async fn list(&self) -> Result<Vec<StoredChannel>>;

    /// `(keyword, record count)` pairs, largest first.
    async fn count_by_keyword(&self) -> Result<Vec<(String, i64)>>;
}

/// Keep the records whose (name, email) pair is absent from `existing`.
pub(crate) fn filter_new<'a>(
    records: &'a [ChannelRecord],
    existing: &[(String, Option<String>)],
) -> Vec<&'a ChannelRecord> {
    records
        .iter()
        .filter(|r| {
            !existing
                .iter()
                .any(|(name, email)| *name == r.name && *email == r.email)
        })
        .collect()
}

/// Distinct emails of a batch, first occurrence order.
pub(crate) fn distinct_emails(records: &[ChannelRecord]) -> Vec<Option<String>> {
    let mut emails: Vec<Option<String>> = Vec::new();
    for r in records {
        if !emails.contains(&r.email) {
            emails.push(r.email.clone());
        }
    }
    emails
}
