use std::time::Duration;

use quotefeed_core::StatsSnapshot;

/// Process-lifetime fetch counters.
///
/// Success and failure are only ever incremented together with the request
/// counter, so `success + failure == requests_made` holds at all times and
/// every counter is monotone between resets.
pub(crate) struct StatsCounters {
    requests_made: u64,
    success_count: u64,
    failure_count: u64,
    total_fetch_time: Duration,
    last_batch_time: Duration,
    last_batch_size: usize,
}

impl StatsCounters {
    pub(crate) const fn new() -> Self {
        Self {
            requests_made: 0,
            success_count: 0,
            failure_count: 0,
            total_fetch_time: Duration::ZERO,
            last_batch_time: Duration::ZERO,
            last_batch_size: 0,
        }
    }

    pub(crate) fn record_success(&mut self, fetch_time: Duration) {
        self.requests_made += 1;
        self.success_count += 1;
        self.total_fetch_time += fetch_time;
    }

    pub(crate) fn record_failure(&mut self) {
        self.requests_made += 1;
        self.failure_count += 1;
    }

    pub(crate) fn record_batch(&mut self, elapsed: Duration, size: usize) {
        self.last_batch_time = elapsed;
        self.last_batch_size = size;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn snapshot(&self, cache_size: usize, cache_ttl: Duration) -> StatsSnapshot {
        let avg_fetch_time = if self.success_count > 0 {
            self.total_fetch_time / u32::try_from(self.success_count).unwrap_or(u32::MAX)
        } else {
            Duration::ZERO
        };
        StatsSnapshot {
            requests_made: self.requests_made,
            success_count: self.success_count,
            failure_count: self.failure_count,
            cache_size,
            cache_ttl,
            avg_fetch_time,
            last_batch_time: self.last_batch_time,
            last_batch_size: self.last_batch_size,
        }
    }
}
