use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};

use quotefeed_core::{FeedConfig, FeedError, QuoteSource, ThrottleConfig};

use crate::cache::QuoteCache;
use crate::stats::StatsCounters;
use crate::throttle::RateState;

/// Cache, rate timestamps, and counters form a single mutual-exclusion
/// domain: every critical section over them is short (a map read/write or a
/// counter bump), and one lock keeps the throttle's check-sleep-record
/// sequence atomic. The lock is never held across the provider call.
pub(crate) struct FeedState {
    pub(crate) cache: QuoteCache,
    pub(crate) rate: RateState,
    pub(crate) stats: StatsCounters,
}

pub(crate) struct Shared {
    pub(crate) source: Arc<dyn QuoteSource>,
    pub(crate) cfg: FeedConfig,
    pub(crate) workers: Arc<Semaphore>,
    pub(crate) state: Mutex<FeedState>,
}

/// Orchestrator that turns "fetch N symbols" into a cache-aware, throttled,
/// bounded-concurrency operation against one [`QuoteSource`].
///
/// Cloning is cheap and every clone shares the same cache, rate state, and
/// counters; independent instances (for test isolation) come from building
/// twice.
#[derive(Clone)]
pub struct QuoteFeed {
    pub(crate) shared: Arc<Shared>,
}

/// Builder for constructing a [`QuoteFeed`] with custom configuration.
pub struct QuoteFeedBuilder {
    source: Arc<dyn QuoteSource>,
    cfg: FeedConfig,
}

impl QuoteFeedBuilder {
    /// Start from the given source and default configuration
    /// (10 minute TTL, 4 workers, the tuned throttle profiles).
    #[must_use]
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self {
            source,
            cfg: FeedConfig::default(),
        }
    }

    /// Set the cache time-to-live. Zero disables caching: every read misses
    /// and every fetch goes to the provider (throttled as usual).
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.cfg.cache_ttl = ttl;
        self
    }

    /// Set the worker pool size, bounding concurrent outbound provider calls.
    #[must_use]
    pub const fn max_workers(mut self, workers: usize) -> Self {
        self.cfg.max_workers = workers;
        self
    }

    /// Replace both throttle profiles.
    #[must_use]
    pub fn throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.cfg.throttle = throttle;
        self
    }

    /// Replace the whole configuration at once.
    #[must_use]
    pub fn config(mut self, cfg: FeedConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns [`FeedError::InvalidConfig`] when `max_workers` is zero or
    /// either mode profile has a zero `max_batch`.
    pub fn build(self) -> Result<QuoteFeed, FeedError> {
        if self.cfg.max_workers == 0 {
            return Err(FeedError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.cfg.throttle.normal.max_batch == 0 || self.cfg.throttle.fast.max_batch == 0 {
            return Err(FeedError::InvalidConfig(
                "max_batch must be at least 1 in both mode profiles".to_string(),
            ));
        }

        let state = FeedState {
            cache: QuoteCache::new(self.cfg.cache_ttl),
            rate: RateState::new(),
            stats: StatsCounters::new(),
        };
        Ok(QuoteFeed {
            shared: Arc::new(Shared {
                source: self.source,
                workers: Arc::new(Semaphore::new(self.cfg.max_workers)),
                cfg: self.cfg,
                state: Mutex::new(state),
            }),
        })
    }
}

impl QuoteFeed {
    /// Start building a feed over `source`.
    #[must_use]
    pub fn builder(source: Arc<dyn QuoteSource>) -> QuoteFeedBuilder {
        QuoteFeedBuilder::new(source)
    }

    /// The configuration the feed was built with.
    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.shared.cfg
    }
}
