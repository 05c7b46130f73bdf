//! quotefeed-core
//!
//! Shared contracts for the quotefeed workspace.
//!
//! - `types`: quote records, fetch-mode profiles, and the snapshot/report
//!   structures returned by the orchestrator.
//! - `source`: the `QuoteSource` capability trait implemented by providers.
//! - `error`: provider fault taxonomy and configuration errors.
//!
//! This crate contains no runtime logic: it exists so that provider
//! implementations and the orchestrator can depend on the same vocabulary
//! without pulling each other in.
#![warn(missing_docs)]

/// Provider fault taxonomy and configuration errors.
pub mod error;
/// The `QuoteSource` capability trait.
pub mod source;
/// Quote records, configuration, and report types.
pub mod types;

pub use error::{FeedError, SourceError};
pub use source::QuoteSource;
pub use types::{
    BatchMetadata, BatchReport, CacheEntryInfo, CacheSnapshot, FeedConfig, FetchMode, MarketPhase,
    ModeProfile, QuoteData, StatsSnapshot, ThrottleConfig,
};
