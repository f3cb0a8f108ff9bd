//! Command-level orchestration: open the database, optionally seed it from
//! snapshot files, then run the harvest loop over the configured keywords.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::{parse_keywords, Config};
use crate::db;
use crate::fetcher::{HttpPageFetcher, PageSource};
use crate::harvest::{HarvestReport, Harvester, KeywordEnd, RetryPolicy};
use crate::migrate;
use crate::seed::{self, SeedOutcome};
use crate::store::SqliteStore;
use crate::throttle::Throttle;

/// `harvest seed`: import snapshot files from `dir` (or the configured one).
pub async fn run_seed(config: &Config, dir: Option<&Path>) -> Result<SeedOutcome> {
    let dir = match dir.or(config.seed.dir.as_deref()) {
        Some(d) => d,
        None => bail!("No seed directory given and seed.dir is not configured"),
    };

    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    let outcome = seed::seed_if_empty(&store, dir, &config.seed.include_globs).await?;
    pool.close().await;

    match &outcome {
        SeedOutcome::StoreNotEmpty => println!("seed skipped: channel store is not empty"),
        SeedOutcome::NoFiles => println!("seed skipped: no files in {}", dir.display()),
        SeedOutcome::Imported {
            files,
            entries,
            inserted,
        } => {
            println!("seed {}", dir.display());
            println!("  files: {}", files);
            println!("  entries: {}", entries);
            println!("  inserted channels: {}", inserted);
        }
    }
    Ok(outcome)
}

/// `harvest run`: seed if configured, then harvest every keyword against
/// the live API.
pub async fn run_harvest(
    config: &Config,
    keywords: Option<&str>,
    skip_seed: bool,
) -> Result<HarvestReport> {
    let fetcher = HttpPageFetcher::new(&config.api).context("Failed to build HTTP client")?;
    run_harvest_with_source(config, &fetcher, keywords, skip_seed).await
}

/// Same as [`run_harvest`] with a caller-supplied page source.
pub async fn run_harvest_with_source(
    config: &Config,
    source: &dyn PageSource,
    keywords: Option<&str>,
    skip_seed: bool,
) -> Result<HarvestReport> {
    let keywords = parse_keywords(keywords.unwrap_or(&config.harvest.keywords));
    if keywords.is_empty() {
        bail!("No keywords to harvest: pass --keywords or set harvest.keywords");
    }

    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    if let (false, Some(dir)) = (skip_seed, config.seed.dir.as_deref()) {
        match seed::seed_if_empty(&store, dir, &config.seed.include_globs).await {
            Ok(outcome) => info!(?outcome, "seed step done"),
            Err(e) => warn!("seed step failed, continuing with harvest: {:#}", e),
        }
    }

    let retry = RetryPolicy {
        max_retries: config.api.rate_limit_retries,
        backoff: Duration::from_secs(config.api.rate_limit_backoff_secs),
    };
    let throttle = Throttle::new(config.harvest.delay_min_secs, config.harvest.delay_max_secs);

    info!(count = keywords.len(), "harvesting keywords");
    let report = Harvester::new(source, &store, &store)
        .with_throttle(throttle)
        .with_retry(retry)
        .run(&keywords)
        .await;

    pool.close().await;

    println!("harvest");
    for k in &report.keywords {
        let end = match &k.end {
            KeywordEnd::Exhausted => "exhausted".to_string(),
            KeywordEnd::EmptyPage => "no more data".to_string(),
            KeywordEnd::Aborted { reason } => format!("aborted ({})", reason),
        };
        println!(
            "  {}: pages {}, fetched {}, saved {}, {}",
            k.keyword, k.pages, k.fetched, k.saved, end
        );
    }
    println!("  total fetched: {}", report.total_fetched());
    println!("  total saved: {}", report.total_saved());
    println!("ok");

    Ok(report)
}
