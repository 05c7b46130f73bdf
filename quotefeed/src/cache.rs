use std::collections::HashMap;
use std::time::{Duration, Instant};

use quotefeed_core::{CacheEntryInfo, CacheSnapshot, QuoteData};

/// One cached quote plus the monotonic time it was stored.
pub(crate) struct CacheEntry {
    pub(crate) data: QuoteData,
    pub(crate) stored_at: Instant,
}

/// In-memory symbol-keyed quote cache with lazily computed freshness.
///
/// There is no expiry job: an entry stays in the map until overwritten or a
/// full [`clear`](QuoteCache::clear), and freshness is decided at read time.
/// Expired entries remain reachable through [`any`](QuoteCache::any) so the
/// fallback policy can serve stale data in preference to nothing.
pub(crate) struct QuoteCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl QuoteCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Look up a fresh entry. Pure in-memory read; a zero TTL makes every
    /// lookup a miss.
    pub(crate) fn fresh(&self, symbol: &str, now: Instant) -> Option<&QuoteData> {
        let entry = self.entries.get(symbol)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            Some(&entry.data)
        } else {
            None
        }
    }

    /// Look up an entry regardless of age.
    pub(crate) fn any(&self, symbol: &str) -> Option<&CacheEntry> {
        self.entries.get(symbol)
    }

    /// Store a quote. Records with the unavailable sentinel are dropped here
    /// so a failed fetch can never replace good cached data.
    pub(crate) fn put(&mut self, data: QuoteData, now: Instant) {
        if !data.has_price() {
            return;
        }
        self.entries.insert(
            data.symbol.clone(),
            CacheEntry {
                data,
                stored_at: now,
            },
        );
    }

    /// Discard all entries.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Non-mutating per-symbol age/freshness report.
    pub(crate) fn snapshot(&self, now: Instant) -> CacheSnapshot {
        let entries = self
            .entries
            .iter()
            .map(|(symbol, entry)| {
                let age = now.duration_since(entry.stored_at);
                let remaining = self.ttl.saturating_sub(age);
                (
                    symbol.clone(),
                    CacheEntryInfo {
                        age,
                        remaining,
                        fresh: age < self.ttl,
                    },
                )
            })
            .collect();
        CacheSnapshot {
            size: self.entries.len(),
            ttl: self.ttl,
            entries,
        }
    }

    pub(crate) const fn ttl(&self) -> Duration {
        self.ttl
    }
}
