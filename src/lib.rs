//! # Channel Harvester
//!
//! Incrementally harvests channel listings from a paginated search API,
//! pulls email addresses and phone numbers out of their descriptions, and
//! stores the deduplicated results in SQLite together with per-keyword
//! pagination cursors, so every run resumes where the last one stopped.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Search API  │──▶│ HarvestLoop  │──▶│    SQLite    │
//! │ PageFetcher │   │ + Contacts   │   │ channels     │
//! └─────────────┘   └──────┬───────┘   │ cursors      │
//!                          │           └──────▲───────┘
//!                  ┌───────┴──────┐           │
//!                  │  Throttle /  │    ┌──────┴───────┐
//!                  │  429 backoff │    │ Seed (JSON)  │
//!                  └──────────────┘    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! harvest init
//! harvest seed --dir ./FilesToWork
//! harvest run --keywords "learn english, learn spanish"
//! harvest stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`contact`] | Email / phone extraction |
//! | [`store`] | Cursor and record stores (SQLite, in-memory) |
//! | [`fetcher`] | Search API page fetcher |
//! | [`throttle`] | Randomized inter-page delay |
//! | [`harvest`] | Resumable per-keyword harvest loop |
//! | [`seed`] | Snapshot file import |
//! | [`ingest`] | Command orchestration |
//! | [`stats`] | Database statistics |
//! | [`export`] | JSON export |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod config;
pub mod contact;
pub mod db;
pub mod export;
pub mod fetcher;
pub mod harvest;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod stats;
pub mod store;
pub mod throttle;
