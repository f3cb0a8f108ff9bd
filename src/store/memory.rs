//! In-memory store implementations for tests and dry runs.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock`. Nothing survives the
//! process.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ChannelRecord, CursorRecord, StoredChannel};

use super::{distinct_emails, filter_new, CursorStore, RecordStore};

#[derive(Default)]
pub struct InMemoryCursorStore {
    cursors: RwLock<HashMap<String, CursorRecord>>,
}

impl InMemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-existing cursors, as if left behind by an earlier run.
    pub fn with_cursors<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let now = chrono::Utc::now().timestamp();
        let cursors = entries
            .into_iter()
            .map(|(k, v)| {
                let keyword = k.into();
                let record = CursorRecord {
                    keyword: keyword.clone(),
                    cursor: v.into(),
                    updated_at: now,
                };
                (keyword, record)
            })
            .collect();
        Self {
            cursors: RwLock::new(cursors),
        }
    }
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn get_cursor(&self, keyword: &str) -> Result<Option<String>> {
        let cursors = self.cursors.read().map_err(|_| anyhow!("cursor lock poisoned"))?;
        Ok(cursors.get(keyword).map(|c| c.cursor.clone()))
    }

    async fn upsert_cursor(&self, keyword: &str, cursor: &str) -> Result<()> {
        let mut cursors = self.cursors.write().map_err(|_| anyhow!("cursor lock poisoned"))?;
        cursors.insert(
            keyword.to_string(),
            CursorRecord {
                keyword: keyword.to_string(),
                cursor: cursor.to_string(),
                updated_at: chrono::Utc::now().timestamp(),
            },
        );
        Ok(())
    }

    async fn list_cursors(&self) -> Result<Vec<CursorRecord>> {
        let cursors = self.cursors.read().map_err(|_| anyhow!("cursor lock poisoned"))?;
        let mut all: Vec<CursorRecord> = cursors.values().cloned().collect();
        all.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        Ok(all)
    }
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<StoredChannel>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn add_batch(&self, records: &[ChannelRecord]) -> Result<usize> {
        let mut stored = self.records.write().map_err(|_| anyhow!("record lock poisoned"))?;

        let emails = distinct_emails(records);
        let existing: Vec<(String, Option<String>)> = stored
            .iter()
            .filter(|s| emails.contains(&s.email))
            .map(|s| (s.name.clone(), s.email.clone()))
            .collect();

        let now = chrono::Utc::now().timestamp();
        let fresh = filter_new(records, &existing);
        let inserted = fresh.len();
        for r in fresh {
            stored.push(StoredChannel {
                id: Uuid::new_v4().to_string(),
                name: r.name.clone(),
                description: r.description.clone(),
                email: r.email.clone(),
                phone_number: r.phone_number.clone(),
                keyword: r.keyword.clone(),
                subscriber_count: r.subscriber_count,
                created_at: now,
            });
        }
        Ok(inserted)
    }

    async fn count(&self) -> Result<i64> {
        let stored = self.records.read().map_err(|_| anyhow!("record lock poisoned"))?;
        Ok(stored.len() as i64)
    }

    async fn list(&self) -> Result<Vec<StoredChannel>> {
        let stored = self.records.read().map_err(|_| anyhow!("record lock poisoned"))?;
        Ok(stored.clone())
    }

    async fn count_by_keyword(&self) -> Result<Vec<(String, i64)>> {
        let stored = self.records.read().map_err(|_| anyhow!("record lock poisoned"))?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for s in stored.iter() {
            *counts.entry(s.keyword.clone()).or_default() += 1;
        }
        let mut counts: Vec<(String, i64)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }
}
