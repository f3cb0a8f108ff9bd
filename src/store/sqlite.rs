//! SQLite-backed [`CursorStore`] and [`RecordStore`].
//!
//! Tables are created by [`crate::migrate`]: `channel_cursors` keyed by
//! keyword, and `channels` with no storage-level uniqueness (dedup happens
//! in [`RecordStore::add_batch`] before insert).

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{ChannelRecord, CursorRecord, StoredChannel};

use super::{distinct_emails, filter_new, CursorStore, RecordStore};

/// Both stores over one [`SqlitePool`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CursorStore for SqliteStore {
    async fn get_cursor(&self, keyword: &str) -> Result<Option<String>> {
        let cursor: Option<String> =
            sqlx::query_scalar("SELECT cursor FROM channel_cursors WHERE keyword = ?")
                .bind(keyword)
                .fetch_optional(&self.pool)
                .await?;
        Ok(cursor)
    }

    async fn upsert_cursor(&self, keyword: &str, cursor: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO channel_cursors (keyword, cursor, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(keyword) DO UPDATE SET cursor = excluded.cursor, updated_at = excluded.updated_at
            "#,
        )
        .bind(keyword)
        .bind(cursor)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_cursors(&self) -> Result<Vec<CursorRecord>> {
        let rows =
            sqlx::query("SELECT keyword, cursor, updated_at FROM channel_cursors ORDER BY keyword")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|row| CursorRecord {
                keyword: row.get("keyword"),
                cursor: row.get("cursor"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn add_batch(&self, records: &[ChannelRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        // `IS` compares NULL emails as equal
        let mut existing: Vec<(String, Option<String>)> = Vec::new();
        for email in distinct_emails(records) {
            let rows = sqlx::query("SELECT name, email FROM channels WHERE email IS ?")
                .bind(&email)
                .fetch_all(&mut *tx)
                .await?;
            existing.extend(rows.iter().map(|row| (row.get("name"), row.get("email"))));
        }

        let now = chrono::Utc::now().timestamp();
        let fresh = filter_new(records, &existing);
        for r in &fresh {
            sqlx::query(
                r#"
                INSERT INTO channels (id, name, description, email, phone_number, keyword, subscriber_count, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&r.name)
            .bind(&r.description)
            .bind(&r.email)
            .bind(&r.phone_number)
            .bind(&r.keyword)
            .bind(r.subscriber_count)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(fresh.len())
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channels")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn list(&self) -> Result<Vec<StoredChannel>> {
        let rows = sqlx::query(
            "SELECT id, name, description, email, phone_number, keyword, subscriber_count, created_at \
             FROM channels ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StoredChannel {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                email: row.get("email"),
                phone_number: row.get("phone_number"),
                keyword: row.get("keyword"),
                subscriber_count: row.get("subscriber_count"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn count_by_keyword(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT keyword, COUNT(*) AS n FROM channels GROUP BY keyword ORDER BY n DESC, keyword",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("keyword"), row.get("n")))
            .collect())
    }
}
