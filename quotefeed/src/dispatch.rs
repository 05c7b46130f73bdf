use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;

use quotefeed_core::{
    BatchMetadata, BatchReport, CacheSnapshot, FetchMode, ModeProfile, QuoteData, StatsSnapshot,
};

use crate::core::QuoteFeed;

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

fn sample_jitter(profile: &ModeProfile) -> Duration {
    if profile.jitter_max <= profile.jitter_min {
        return profile.jitter_min;
    }
    let min = u64::try_from(profile.jitter_min.as_millis()).unwrap_or(u64::MAX);
    let max = u64::try_from(profile.jitter_max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rand::rng().random_range(min..=max))
}

impl QuoteFeed {
    /// Fetch one symbol's quote, serving fresh cache without throttling.
    ///
    /// Behavior:
    /// - A fresh cache hit returns immediately; no throttle, no stats.
    /// - Otherwise the call waits out the throttle, hits the provider, and
    ///   records the outcome.
    /// - A failed or price-less live fetch degrades to the last cached value
    ///   (marked stale) when one exists, and to an error-phase record when
    ///   none does. The provider's failure never propagates: this always
    ///   returns a [`QuoteData`].
    pub async fn fetch_one(&self, symbol: &str, mode: FetchMode) -> QuoteData {
        let symbol = normalize(symbol);
        {
            let state = self.shared.state.lock().await;
            if let Some(quote) = state.cache.fresh(&symbol, Instant::now()) {
                tracing::debug!(symbol = %symbol, "serving fresh cached quote");
                return quote.clone();
            }
        }
        self.fetch_live(&symbol, mode).await
    }

    /// Throttled live fetch plus outcome bookkeeping. `symbol` is already
    /// normalized and known to have missed the fresh-cache check.
    async fn fetch_live(&self, symbol: &str, mode: FetchMode) -> QuoteData {
        let profile = self.shared.cfg.throttle.profile(mode);

        // Compute, sleep, and record under one lock acquisition: releasing
        // between the check and the record would let two workers both observe
        // the same timestamps and each compute a too-short delay.
        {
            let mut state = self.shared.state.lock().await;
            let jitter = sample_jitter(profile);
            let delay = state
                .rate
                .required_delay(symbol, Instant::now(), profile, jitter);
            if !delay.is_zero() {
                tracing::debug!(
                    symbol = %symbol,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "throttling before live fetch"
                );
                tokio::time::sleep(delay).await;
            }
            state.rate.record(symbol, Instant::now());
        }

        // Provider call runs outside the lock so a slow network round-trip
        // cannot stall cache reads or throttle computations on other workers.
        let started = Instant::now();
        let outcome = self.shared.source.fetch_quote(symbol).await;
        let fetch_time = started.elapsed();

        let mut state = self.shared.state.lock().await;
        match outcome {
            Ok(quote) if quote.has_price() => {
                state.cache.put(quote.clone(), Instant::now());
                state.stats.record_success(fetch_time);
                quote
            }
            Ok(quote) => {
                state.stats.record_failure();
                if let Some(entry) = state.cache.any(symbol) {
                    tracing::warn!(symbol = %symbol, "no price from provider, serving stale cache");
                    entry.data.clone().into_stale()
                } else {
                    quote
                }
            }
            Err(err) => {
                state.stats.record_failure();
                if let Some(entry) = state.cache.any(symbol) {
                    tracing::warn!(symbol = %symbol, error = %err, "provider failed, serving stale cache");
                    entry.data.clone().into_stale()
                } else {
                    QuoteData::error(symbol, err.to_string())
                }
            }
        }
    }

    /// Fetch a batch of symbols, bounded by the worker pool.
    ///
    /// Behavior:
    /// - Symbols are uppercased and deduplicated preserving first-seen order;
    ///   blank entries are dropped. Metadata counts are over the distinct
    ///   symbols.
    /// - Fresh cache hits are copied into the result before any throttled
    ///   work starts, so an all-cached batch never sleeps.
    /// - Misses run in shuffled sub-batches of the profile's `max_batch`;
    ///   every worker of a sub-batch completes before the next sub-batch is
    ///   submitted, with a short pause in between (none after the last).
    /// - A worker fault surfaces as an error-phase record for that symbol
    ///   only; the batch always completes with one record per distinct input
    ///   symbol.
    pub async fn fetch_many(&self, symbols: &[impl AsRef<str>], mode: FetchMode) -> BatchReport {
        let started = Instant::now();
        let profile = self.shared.cfg.throttle.profile(mode);

        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for raw in symbols {
            let symbol = normalize(raw.as_ref());
            if !symbol.is_empty() && seen.insert(symbol.clone()) {
                distinct.push(symbol);
            }
        }
        if distinct.is_empty() {
            return BatchReport {
                quotes: HashMap::new(),
                metadata: BatchMetadata {
                    elapsed: Duration::ZERO,
                    symbols_processed: 0,
                    avg_per_symbol: Duration::ZERO,
                    cache_hits: 0,
                    cache_misses: 0,
                    mode,
                },
            };
        }

        // Single cache sweep: hits resolve now, misses go to the pool.
        let mut quotes: HashMap<String, QuoteData> = HashMap::with_capacity(distinct.len());
        let mut misses = Vec::new();
        {
            let state = self.shared.state.lock().await;
            let now = Instant::now();
            for symbol in &distinct {
                match state.cache.fresh(symbol, now) {
                    Some(quote) => {
                        quotes.insert(symbol.clone(), quote.clone());
                    }
                    None => misses.push(symbol.clone()),
                }
            }
        }
        let cache_hits = quotes.len();
        let cache_misses = misses.len();
        tracing::debug!(
            hits = cache_hits,
            misses = cache_misses,
            fast = matches!(mode, FetchMode::Fast),
            "dispatching quote batch"
        );

        let sub_batches: Vec<Vec<String>> =
            misses.chunks(profile.max_batch).map(<[String]>::to_vec).collect();
        let last = sub_batches.len();
        for (idx, mut batch) in sub_batches.into_iter().enumerate() {
            // Randomized request order avoids a predictable, replayable
            // pattern against the provider.
            batch.shuffle(&mut rand::rng());

            let mut handles = Vec::with_capacity(batch.len());
            for symbol in batch {
                let feed = self.clone();
                let workers = Arc::clone(&self.shared.workers);
                handles.push((
                    symbol.clone(),
                    tokio::spawn(async move {
                        let _permit = workers
                            .acquire_owned()
                            .await
                            .expect("worker pool semaphore closed");
                        feed.fetch_one(&symbol, mode).await
                    }),
                ));
            }
            for (symbol, handle) in handles {
                let data = match handle.await {
                    Ok(quote) => quote,
                    Err(err) => {
                        // Join failures (worker panic) convert at this
                        // boundary; one symbol's fault never aborts the batch.
                        tracing::warn!(symbol = %symbol, error = %err, "quote worker failed");
                        QuoteData::error(&symbol, format!("worker failed: {err}"))
                    }
                };
                quotes.insert(symbol, data);
            }
            if idx + 1 < last {
                tokio::time::sleep(profile.batch_pause).await;
            }
        }

        let elapsed = started.elapsed();
        {
            let mut state = self.shared.state.lock().await;
            state.stats.record_batch(elapsed, distinct.len());
        }
        let metadata = BatchMetadata {
            elapsed,
            symbols_processed: distinct.len(),
            avg_per_symbol: elapsed / u32::try_from(distinct.len()).unwrap_or(u32::MAX),
            cache_hits,
            cache_misses,
            mode,
        };
        BatchReport { quotes, metadata }
    }

    /// Discard every cached quote. Subsequent reads miss until repopulated.
    pub async fn clear_cache(&self) {
        let mut state = self.shared.state.lock().await;
        state.cache.clear();
        tracing::info!("quote cache cleared");
    }

    /// Snapshot the running counters together with the current cache size.
    pub async fn stats(&self) -> StatsSnapshot {
        let state = self.shared.state.lock().await;
        state.stats.snapshot(state.cache.len(), state.cache.ttl())
    }

    /// Zero the counters and reseed the global last-request timestamp so the
    /// throttle does not read the idle gap as "due immediately".
    pub async fn reset_stats(&self) {
        let mut state = self.shared.state.lock().await;
        state.stats.reset();
        state.rate.reseed(Instant::now());
        tracing::info!("fetch stats reset");
    }

    /// Per-symbol age and remaining-freshness report; mutates nothing.
    pub async fn cache_info(&self) -> CacheSnapshot {
        let state = self.shared.state.lock().await;
        state.cache.snapshot(Instant::now())
    }
}
