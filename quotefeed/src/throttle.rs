use std::collections::HashMap;
use std::time::{Duration, Instant};

use quotefeed_core::ModeProfile;

/// Last-request timestamps shared by every live fetch.
///
/// Mutated on every live-fetch attempt, never on cache hits. Reads and
/// writes happen under the feed lock; the dispatcher keeps that lock through
/// its compute-sleep-record sequence so two workers cannot both observe the
/// same stale timestamps and each compute a too-short delay.
pub(crate) struct RateState {
    last_global: Option<Instant>,
    last_symbol: HashMap<String, Instant>,
}

impl RateState {
    pub(crate) fn new() -> Self {
        Self {
            last_global: None,
            last_symbol: HashMap::new(),
        }
    }

    /// Delay this fetch must wait before hitting the provider.
    ///
    /// Each of the two spacings (per-symbol, global) contributes its deficit
    /// topped up with `jitter` when violated; the two are combined by taking
    /// the larger, never summed, and the result is capped at the profile's
    /// `delay_cap`.
    pub(crate) fn required_delay(
        &self,
        symbol: &str,
        now: Instant,
        profile: &ModeProfile,
        jitter: Duration,
    ) -> Duration {
        let deficit = |last: Option<&Instant>, spacing: Duration| -> Duration {
            match last {
                Some(&at) => {
                    let since = now.duration_since(at);
                    if since < spacing {
                        spacing - since + jitter
                    } else {
                        Duration::ZERO
                    }
                }
                None => Duration::ZERO,
            }
        };

        let symbol_delay = deficit(self.last_symbol.get(symbol), profile.symbol_spacing);
        let global_delay = deficit(self.last_global.as_ref(), profile.global_spacing);

        symbol_delay.max(global_delay).min(profile.delay_cap)
    }

    /// Stamp `now` as the last-request time for the symbol and globally.
    pub(crate) fn record(&mut self, symbol: &str, now: Instant) {
        self.last_global = Some(now);
        self.last_symbol.insert(symbol.to_string(), now);
    }

    /// Reseed the global timestamp, used when stats are reset so a long idle
    /// gap is not read as "due immediately".
    pub(crate) fn reseed(&mut self, now: Instant) {
        self.last_global = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(symbol_ms: u64, global_ms: u64, cap_ms: u64) -> ModeProfile {
        ModeProfile {
            symbol_spacing: Duration::from_millis(symbol_ms),
            global_spacing: Duration::from_millis(global_ms),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            delay_cap: Duration::from_millis(cap_ms),
            max_batch: 12,
            batch_pause: Duration::ZERO,
        }
    }

    #[test]
    fn first_fetch_pays_no_delay() {
        let rate = RateState::new();
        let d = rate.required_delay("AAPL", Instant::now(), &profile(500, 200, 1000), Duration::ZERO);
        assert_eq!(d, Duration::ZERO);
    }

    #[test]
    fn immediate_repeat_pays_symbol_spacing() {
        let mut rate = RateState::new();
        let now = Instant::now();
        rate.record("AAPL", now);
        let d = rate.required_delay("AAPL", now, &profile(500, 200, 1000), Duration::ZERO);
        assert_eq!(d, Duration::from_millis(500));
    }

    #[test]
    fn different_symbol_pays_only_global_spacing() {
        let mut rate = RateState::new();
        let now = Instant::now();
        rate.record("AAPL", now);
        let d = rate.required_delay("MSFT", now, &profile(500, 200, 1000), Duration::ZERO);
        assert_eq!(d, Duration::from_millis(200));
    }

    #[test]
    fn delays_combine_by_max_not_sum() {
        let mut rate = RateState::new();
        let now = Instant::now();
        rate.record("AAPL", now);
        let jitter = Duration::from_millis(20);
        let d = rate.required_delay("AAPL", now, &profile(500, 200, 1000), jitter);
        assert_eq!(d, Duration::from_millis(520));
    }

    #[test]
    fn delay_is_capped() {
        let mut rate = RateState::new();
        let now = Instant::now();
        rate.record("AAPL", now);
        let d = rate.required_delay("AAPL", now, &profile(500, 200, 300), Duration::ZERO);
        assert_eq!(d, Duration::from_millis(300));
    }

    #[test]
    fn elapsed_spacing_means_no_delay() {
        let mut rate = RateState::new();
        let now = Instant::now();
        rate.record("AAPL", now);
        let later = now + Duration::from_millis(600);
        let d = rate.required_delay("AAPL", later, &profile(500, 200, 1000), Duration::ZERO);
        assert_eq!(d, Duration::ZERO);
    }
}
