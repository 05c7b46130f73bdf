use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::QuoteData;

/// Capability trait for anything that can produce one symbol's quote.
///
/// Implementations may scrape HTML, call a JSON API, or serve fixtures; the
/// orchestrator only assumes the call may be slow, may fail, and carries no
/// internal concurrency guarantees. Implementations are responsible for
/// bounding their own network timeout; the orchestrator adds none.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Stable identifier for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Fetch a point-in-time quote for `symbol`.
    ///
    /// Returning `Ok` with the [`QuoteData::UNAVAILABLE`] price signals
    /// "answered, but no price could be determined" without failing the call.
    ///
    /// # Errors
    /// Returns a [`SourceError`] when the provider call fails outright
    /// (transport failure, block page, timeout, unparseable response).
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteData, SourceError>;
}
