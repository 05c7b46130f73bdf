use thiserror::Error;

/// Fault raised by a [`crate::QuoteSource`] implementation.
///
/// Note the asymmetry with the sentinel price: a provider that answered but
/// could not determine a price returns `Ok` with
/// [`crate::QuoteData::UNAVAILABLE`]; `SourceError` is reserved for calls
/// that failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport-level failure (connect, TLS, read).
    #[error("network failure: {msg}")]
    Network {
        /// Human-readable transport error.
        msg: String,
    },

    /// The provider refused the request (firewall page, HTTP 403, rate-limit block).
    #[error("blocked by provider")]
    Blocked,

    /// The provider did not answer within the source's own deadline.
    #[error("provider timed out")]
    Timeout,

    /// The response arrived but could not be parsed into a quote.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Unknown/opaque error.
    #[error("source error: {0}")]
    Other(String),
}

impl SourceError {
    /// Helper: build a `Network` error from any displayable cause.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network { msg: msg.into() }
    }

    /// Helper: build a `Malformed` error from any displayable cause.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Error raised when assembling an orchestrator from invalid configuration.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A configuration value was rejected by the builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
