//! Quote records, fetch-mode configuration, and orchestrator report types.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Market phase attached to a quote record.
///
/// `Stale` is stamped by the fallback policy when a cached value substitutes
/// for a failed live fetch; `Error` marks records synthesized when neither a
/// live fetch nor the cache could produce data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MarketPhase {
    /// Regular trading session.
    Open,
    /// Market closed.
    Closed,
    /// Pre-market session.
    PreMarket,
    /// After-hours session.
    AfterHours,
    /// Trading halted for the instrument.
    Halted,
    /// Phase could not be determined.
    #[default]
    Unknown,
    /// Cached data substituting for a failed live fetch.
    Stale,
    /// No data could be obtained at all.
    Error,
}

/// A single symbol's quote record.
///
/// Produced either by a [`crate::QuoteSource`] or by the fallback policy
/// (which clones a cached record and annotates it via [`QuoteData::into_stale`]).
/// Prices and changes are provider-formatted strings; the
/// [`QuoteData::UNAVAILABLE`] sentinel signals "no price could be determined"
/// without raising an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteData {
    /// Uppercase-normalized symbol.
    pub symbol: String,
    /// Formatted price (e.g. `"$190.00"`) or the unavailable sentinel.
    pub price: String,
    /// Formatted signed delta/percent (e.g. `"+1.25 (0.66%)"`) or the sentinel.
    pub change: String,
    /// Market phase at fetch time.
    pub phase: MarketPhase,
    /// Wall-clock time the fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// Detail for error-phase records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when this record is a stale cache clone rather than live data.
    #[serde(default)]
    pub stale: bool,
}

impl QuoteData {
    /// Sentinel price/change value meaning "could not be determined".
    pub const UNAVAILABLE: &'static str = "N/A";

    /// Build a record with sentinel price and change for `symbol`.
    #[must_use]
    pub fn unavailable(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: Self::UNAVAILABLE.to_string(),
            change: Self::UNAVAILABLE.to_string(),
            phase: MarketPhase::Unknown,
            fetched_at: Utc::now(),
            error: None,
            stale: false,
        }
    }

    /// Build an error-phase record carrying `detail`.
    #[must_use]
    pub fn error(symbol: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            phase: MarketPhase::Error,
            error: Some(detail.into()),
            ..Self::unavailable(symbol)
        }
    }

    /// Whether this record carries a usable (non-sentinel) price.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.price != Self::UNAVAILABLE
    }

    /// Annotate a cached clone as stale: appends a `" (cached)"` marker to the
    /// price, stamps [`MarketPhase::Stale`], and sets the stale flag.
    #[must_use]
    pub fn into_stale(mut self) -> Self {
        self.price.push_str(" (cached)");
        self.phase = MarketPhase::Stale;
        self.stale = true;
        self
    }
}

/// Throttle policy selector threaded through every fetch operation.
///
/// `Fast` trades provider politeness for latency and exists for bulk initial
/// loads where many cache misses arrive at once; steady-state refreshes use
/// `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchMode {
    /// Full spacing between provider requests.
    #[default]
    Normal,
    /// Reduced spacing for initial bulk loads.
    Fast,
}

/// Concrete throttle/batching parameters for one [`FetchMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Minimum spacing between two live fetches of the same symbol.
    pub symbol_spacing: Duration,
    /// Minimum spacing between any two live fetches.
    pub global_spacing: Duration,
    /// Lower bound of the jitter added to a violated spacing.
    pub jitter_min: Duration,
    /// Upper bound of the jitter added to a violated spacing.
    pub jitter_max: Duration,
    /// Hard cap on any single computed delay.
    pub delay_cap: Duration,
    /// Maximum number of symbols submitted to the worker pool at once.
    pub max_batch: usize,
    /// Pause inserted between sub-batches (not after the last).
    pub batch_pause: Duration,
}

/// Per-mode throttle profiles.
///
/// The default constants were tuned empirically against one rate-sensitive
/// provider; treat them as configuration, not contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Profile used by [`FetchMode::Normal`].
    pub normal: ModeProfile,
    /// Profile used by [`FetchMode::Fast`].
    pub fast: ModeProfile,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            normal: ModeProfile {
                symbol_spacing: Duration::from_millis(500),
                global_spacing: Duration::from_millis(200),
                jitter_min: Duration::from_millis(10),
                jitter_max: Duration::from_millis(50),
                delay_cap: Duration::from_secs(1),
                max_batch: 12,
                batch_pause: Duration::from_millis(200),
            },
            fast: ModeProfile {
                symbol_spacing: Duration::from_millis(100),
                global_spacing: Duration::from_millis(50),
                jitter_min: Duration::from_millis(10),
                jitter_max: Duration::from_millis(20),
                delay_cap: Duration::from_millis(300),
                max_batch: 20,
                batch_pause: Duration::from_millis(100),
            },
        }
    }
}

impl ThrottleConfig {
    /// Resolve the profile for `mode`.
    #[must_use]
    pub const fn profile(&self, mode: FetchMode) -> &ModeProfile {
        match mode {
            FetchMode::Normal => &self.normal,
            FetchMode::Fast => &self.fast,
        }
    }
}

/// Construction-time configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum age at which a cached quote is served without a live fetch.
    /// A zero TTL disables caching entirely.
    pub cache_ttl: Duration,
    /// Size of the worker pool; bounds concurrent outbound provider calls.
    pub max_workers: usize,
    /// Throttle profiles for both fetch modes.
    pub throttle: ThrottleConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(600),
            max_workers: 4,
            throttle: ThrottleConfig::default(),
        }
    }
}

/// Point-in-time view of the running counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Live fetch attempts (cache hits excluded).
    pub requests_made: u64,
    /// Live fetches that produced a usable price.
    pub success_count: u64,
    /// Live fetches that errored or returned the sentinel.
    pub failure_count: u64,
    /// Number of symbols currently cached.
    pub cache_size: usize,
    /// Configured cache TTL.
    pub cache_ttl: Duration,
    /// Mean fetch time across successful requests; zero when none yet.
    pub avg_fetch_time: Duration,
    /// Wall time of the most recent batch; zero before any batch.
    pub last_batch_time: Duration,
    /// Distinct symbols in the most recent batch; zero before any batch.
    pub last_batch_size: usize,
}

/// Freshness report for one cached symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntryInfo {
    /// Time since the entry was stored.
    pub age: Duration,
    /// Remaining freshness window (zero once expired).
    pub remaining: Duration,
    /// Whether the entry would still be served from cache.
    pub fresh: bool,
}

/// Non-mutating view of the cache contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Number of cached symbols.
    pub size: usize,
    /// Configured TTL.
    pub ttl: Duration,
    /// Per-symbol freshness report.
    pub entries: HashMap<String, CacheEntryInfo>,
}

/// Timing and accounting for one `fetch_many` call.
///
/// `cache_hits` and `cache_misses` are counts over the distinct input
/// symbols, and always satisfy `cache_hits + cache_misses == distinct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetadata {
    /// Total wall time for the batch.
    pub elapsed: Duration,
    /// Distinct symbols processed.
    pub symbols_processed: usize,
    /// `elapsed / symbols_processed`; zero for an empty batch.
    pub avg_per_symbol: Duration,
    /// Symbols served directly from fresh cache.
    pub cache_hits: usize,
    /// Symbols that required a live fetch.
    pub cache_misses: usize,
    /// Mode the batch ran under.
    pub mode: FetchMode,
}

/// Result of a `fetch_many` call: one quote per distinct input symbol plus
/// batch metadata, kept strictly apart from the symbol map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One record per distinct input symbol.
    pub quotes: HashMap<String, QuoteData>,
    /// Timing and hit/miss accounting.
    pub metadata: BatchMetadata,
}
