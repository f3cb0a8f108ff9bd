//! Export harvested channels as JSON.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::{CursorRecord, StoredChannel};
use crate::store::{CursorStore, RecordStore, SqliteStore};

#[derive(Serialize)]
struct ExportData {
    channels: Vec<StoredChannel>,
    cursors: Vec<CursorRecord>,
}

/// Export all stored channels and cursors.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    let channels = store.list().await?;
    let cursors = store.list_cursors().await?;
    let channel_count = channels.len();

    let data = ExportData { channels, cursors };
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &json)?;
            eprintln!("Exported {} channels to {}", channel_count, path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    pool.close().await;
    Ok(())
}
