//! # Channel Harvester CLI (`harvest`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `harvest init` | Create the SQLite database and schema |
//! | `harvest seed` | Import snapshot JSON files into an empty store |
//! | `harvest run` | Harvest the configured keywords, resuming from stored cursors |
//! | `harvest stats` | Show channel counts and pagination state |
//! | `harvest export` | Dump stored channels and cursors as JSON |
//!
//! Progress logs go to stderr (filter with `RUST_LOG`); command summaries go
//! to stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use channel_harvester::{config, export, ingest, migrate, stats};

/// Channel Harvester — resumable harvesting of channel listings and their
/// published contact details.
#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Channel Harvester — resumable harvesting of channel contact details",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/harvest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Import snapshot JSON files. Only runs while the channel store is empty.
    Seed {
        /// Directory of snapshot files; defaults to `seed.dir`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Harvest keywords from the search API.
    ///
    /// Each keyword resumes from its stored cursor. A failing keyword is
    /// logged and skipped; the run continues with the next one.
    Run {
        /// Comma-separated keywords; overrides `harvest.keywords`.
        #[arg(long)]
        keywords: Option<String>,

        /// Do not run the seed import first.
        #[arg(long)]
        skip_seed: bool,
    },

    /// Show stored channel counts and per-keyword cursors.
    Stats,

    /// Export stored channels and cursors as JSON.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed { dir } => {
            ingest::run_seed(&cfg, dir.as_deref()).await?;
        }
        Commands::Run {
            keywords,
            skip_seed,
        } => {
            ingest::run_harvest(&cfg, keywords.as_deref(), skip_seed).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
