//! One-time import of local JSON snapshot files.
//!
//! Each file holds `{hasMore, recordNumber, records: [...]}`. Entries go
//! through the same contact filter as live pages, and everything is saved
//! in one batch. The import only runs while the record store is empty.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::models::{ChannelRecord, SeedFile};
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already had records; nothing was read.
    StoreNotEmpty,
    /// No snapshot files matched.
    NoFiles,
    Imported {
        files: usize,
        entries: usize,
        inserted: usize,
    },
}

pub async fn seed_if_empty(
    records: &dyn RecordStore,
    dir: &Path,
    include_globs: &[String],
) -> Result<SeedOutcome> {
    if !records.is_empty().await? {
        info!("channel store is not empty, skipping seed import");
        return Ok(SeedOutcome::StoreNotEmpty);
    }

    let files = list_seed_files(dir, include_globs)?;
    if files.is_empty() {
        info!(dir = %dir.display(), "no seed files found");
        return Ok(SeedOutcome::NoFiles);
    }

    let mut entries = 0usize;
    let mut batch: Vec<ChannelRecord> = Vec::new();
    for path in &files {
        let Some(seed) = read_seed_file(path)? else {
            warn!(file = %path.display(), "empty seed file, skipping");
            continue;
        };
        entries += seed.records.len();
        batch.extend(seed.records.into_iter().filter_map(|r| r.into_record()));
    }

    let inserted = records.add_batch(&batch).await?;
    info!(
        files = files.len(),
        entries,
        with_contacts = batch.len(),
        inserted,
        "seed import finished"
    );

    Ok(SeedOutcome::Imported {
        files: files.len(),
        entries,
        inserted,
    })
}

/// Files directly under `dir` matching the include globs, sorted by path.
pub fn list_seed_files(dir: &Path, include_globs: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Seed directory does not exist: {}", dir.display());
    }

    let include_set = build_globset(include_globs)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if !include_set.is_match(relative) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    files.sort();
    Ok(files)
}

fn read_seed_file(path: &Path) -> Result<Option<SeedFile>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;
    Ok(Some(seed))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
