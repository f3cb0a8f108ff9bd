//! Harvest statistics.
//!
//! Summarises what is stored: channel totals, how many carry emails or
//! phone numbers, per-keyword counts, and where each keyword's pagination
//! currently stands. Used by `harvest stats`.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::store::{CursorStore, RecordStore, SqliteStore};

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    let total = store.count().await?;
    let with_email: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channels WHERE email IS NOT NULL")
        .fetch_one(&pool)
        .await?;
    let with_phone: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM channels WHERE phone_number IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Channel Harvester — Database Stats");
    println!("==================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Channels:    {}", total);
    println!("  With email:  {}", with_email);
    println!("  With phone:  {}", with_phone);

    let by_keyword = store.count_by_keyword().await?;
    let cursors = store.list_cursors().await?;

    if !by_keyword.is_empty() || !cursors.is_empty() {
        println!();
        println!("  {:<28} {:>8}  {:<20} CURSOR", "KEYWORD", "CHANNELS", "LAST PAGE");
        println!("  {}", "-".repeat(72));

        let mut keywords: Vec<&str> = by_keyword.iter().map(|(k, _)| k.as_str()).collect();
        for c in &cursors {
            if !keywords.contains(&c.keyword.as_str()) {
                keywords.push(&c.keyword);
            }
        }

        for keyword in keywords {
            let count = by_keyword
                .iter()
                .find(|(k, _)| k == keyword)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            let cursor = cursors.iter().find(|c| c.keyword == keyword);
            let last_page = cursor
                .map(|c| format_ts(c.updated_at))
                .unwrap_or_else(|| "never".to_string());
            let token = cursor.map(|c| c.cursor.as_str()).unwrap_or("-");
            let label = if keyword.is_empty() { "(seed)" } else { keyword };
            println!(
                "  {:<28} {:>8}  {:<20} {}",
                label,
                count,
                last_page,
                truncate(token, 24)
            );
        }
    }

    println!();
    pool.close().await;
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…", head)
    }
}
