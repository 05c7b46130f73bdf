//! quotefeed-mock
//!
//! A scripted [`QuoteSource`] for tests and examples. Behavior is driven from
//! the outside through a [`ScriptController`] handle: per-symbol rules select
//! what `fetch_quote` does, and the source keeps a timestamped call log plus
//! an in-flight high-water mark so tests can assert throttling and worker
//! bounds without touching orchestrator internals.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use quotefeed_core::{MarketPhase, QuoteData, QuoteSource, SourceError};

/// Instruction for how `fetch_quote` should behave for a given symbol.
#[derive(Clone)]
pub enum SourceBehavior {
    /// Return the provided record immediately.
    Quote(QuoteData),
    /// Answer with the unavailable-price sentinel.
    Unavailable,
    /// Fail immediately with the provided error.
    Fail(SourceError),
    /// Sleep for the duration, then return the fixture quote for the symbol.
    Delay(Duration),
    /// Hang indefinitely (simulate a stuck provider call).
    Hang,
    /// Return the deterministic fixture quote for the symbol.
    Fixture,
}

/// One entry in the call log.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Symbol passed to `fetch_quote`.
    pub symbol: String,
    /// When the call arrived.
    pub at: Instant,
}

#[derive(Default)]
struct ScriptState {
    rules: HashMap<String, SourceBehavior>,
    fallback: Option<SourceBehavior>,
    calls: Vec<CallRecord>,
}

/// Concurrent-call gauge, kept outside the script lock so a permit can be
/// released from `Drop` even when the owning call hangs and is cancelled.
#[derive(Default)]
struct FlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

struct FlightPermit {
    gauge: Arc<FlightGauge>,
}

impl FlightPermit {
    fn acquire(gauge: &Arc<FlightGauge>) -> Self {
        let now = gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
        gauge.peak.fetch_max(now, Ordering::SeqCst);
        Self {
            gauge: Arc::clone(gauge),
        }
    }
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Controller handle used by tests to drive the scripted source.
pub struct ScriptController {
    state: Arc<Mutex<ScriptState>>,
    gauge: Arc<FlightGauge>,
}

impl ScriptController {
    /// Set the behavior for `fetch_quote` calls on a specific symbol.
    pub async fn set_behavior(&self, symbol: impl Into<String>, behavior: SourceBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(symbol.into(), behavior);
    }

    /// Set the behavior for symbols without an explicit rule.
    /// Without this, unruled symbols get their fixture quote.
    pub async fn set_fallback(&self, behavior: SourceBehavior) {
        let mut guard = self.state.lock().await;
        guard.fallback = Some(behavior);
    }

    /// Return a copy of the timestamped call log.
    pub async fn calls(&self) -> Vec<CallRecord> {
        let guard = self.state.lock().await;
        guard.calls.clone()
    }

    /// Number of `fetch_quote` calls seen for `symbol`.
    pub async fn call_count(&self, symbol: &str) -> usize {
        let guard = self.state.lock().await;
        guard.calls.iter().filter(|c| c.symbol == symbol).count()
    }

    /// Number of `fetch_quote` calls in flight right now.
    pub fn in_flight(&self) -> usize {
        self.gauge.current.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }

    /// Clear all rules, the call log, and the in-flight high-water mark.
    pub async fn clear(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.fallback = None;
        guard.calls.clear();
        self.gauge.peak.store(0, Ordering::SeqCst);
    }
}

/// A quote source that defers all behavior to an external controller.
pub struct ScriptedSource {
    state: Arc<Mutex<ScriptState>>,
    gauge: Arc<FlightGauge>,
}

impl ScriptedSource {
    /// Create a scripted source and its controller.
    #[must_use]
    pub fn new_with_controller() -> (Arc<dyn QuoteSource>, ScriptController) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        let gauge = Arc::new(FlightGauge::default());
        let controller = ScriptController {
            state: Arc::clone(&state),
            gauge: Arc::clone(&gauge),
        };
        let me = Arc::new(Self { state, gauge });
        (me as Arc<dyn QuoteSource>, controller)
    }
}

/// Deterministic quote for a symbol, in the shape a live provider would emit.
#[must_use]
pub fn fixture_quote(symbol: &str) -> QuoteData {
    let (price, change) = match symbol {
        "AAPL" => ("$190.00", "+2.00 (1.06%)"),
        "MSFT" => ("$420.00", "+2.00 (0.48%)"),
        "NVDA" => ("$1000.00", "+10.00 (1.01%)"),
        "GOOGL" => ("$150.00", "+2.00 (1.35%)"),
        "KO" => ("$60.00", "+0.50 (0.84%)"),
        _ => ("$100.00", "+1.00 (1.00%)"),
    };
    QuoteData {
        symbol: symbol.to_string(),
        price: price.to_string(),
        change: change.to_string(),
        phase: MarketPhase::Open,
        fetched_at: chrono::Utc::now(),
        error: None,
        stale: false,
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted-mock"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteData, SourceError> {
        // Released on every exit, including cancellation of a hung call.
        let _permit = FlightPermit::acquire(&self.gauge);

        // Log the call and take a behavior snapshot without holding the lock
        // across await points.
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(CallRecord {
                symbol: symbol.to_string(),
                at: Instant::now(),
            });
            guard
                .rules
                .get(symbol)
                .or(guard.fallback.as_ref())
                .cloned()
                .unwrap_or(SourceBehavior::Fixture)
        };

        match behavior {
            SourceBehavior::Quote(q) => Ok(q),
            SourceBehavior::Unavailable => Ok(QuoteData::unavailable(symbol)),
            SourceBehavior::Fail(e) => Err(e),
            SourceBehavior::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(fixture_quote(symbol))
            }
            SourceBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            SourceBehavior::Fixture => Ok(fixture_quote(symbol)),
        }
    }
}
