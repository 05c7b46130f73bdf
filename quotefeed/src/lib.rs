//! quotefeed orchestrates rate-safe quote retrieval over a pluggable source.
//!
//! Overview
//! - Turns "fetch N symbols" into a bounded-concurrency, cache-aware,
//!   throttled operation against a single [`QuoteSource`].
//! - Fresh cache hits are served immediately and never sleep; misses go
//!   through a dual throttle (global and per-symbol minimum spacing with
//!   jitter) before reaching the provider.
//! - Misses are processed in shuffled sub-batches by a fixed-size worker
//!   pool, with a short pause between sub-batches to spread load.
//! - Failed or empty live fetches degrade to the last cached value, marked
//!   stale, rather than surfacing an error; `fetch_one` and `fetch_many`
//!   always return data.
//! - Running counters (requests, successes, failures, timing) and cache
//!   freshness are observable through snapshots.
//!
//! Key behaviors and trade-offs
//! - Fast mode shrinks throttle minimums roughly five-fold and raises the
//!   sub-batch size; use it for initial bulk loads where many misses arrive
//!   at once, and normal mode for steady-state refreshes.
//! - One lock guards cache, rate state, and stats. It is held across the
//!   throttle sleep (the check-sleep-record sequence must be atomic or two
//!   workers both compute a too-short delay) but never across the provider
//!   call itself.
//! - A stale cached price is always preferred over "N/A"; consumers can
//!   detect substitution through the stale flag and `Stale` market phase.
//!
//! Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotefeed::{FetchMode, QuoteFeed};
//!
//! let feed = QuoteFeed::builder(Arc::new(MyScraper::new()))
//!     .cache_ttl(std::time::Duration::from_secs(600))
//!     .max_workers(4)
//!     .build()?;
//!
//! let report = feed.fetch_many(&["AAPL", "MSFT", "NVDA"], FetchMode::Fast).await;
//! let one = feed.fetch_one("AAPL", FetchMode::Normal).await;
//! let stats = feed.stats().await;
//! ```
#![warn(missing_docs)]

mod cache;
pub(crate) mod core;
mod dispatch;
mod stats;
mod throttle;

pub use crate::core::{QuoteFeed, QuoteFeedBuilder};

// Re-export core types for convenience
pub use quotefeed_core::{
    BatchMetadata, BatchReport, CacheEntryInfo, CacheSnapshot, FeedConfig, FeedError, FetchMode,
    MarketPhase, ModeProfile, QuoteData, QuoteSource, SourceError, StatsSnapshot, ThrottleConfig,
};
