use std::time::Duration;

use quotefeed::{
    FeedConfig, FetchMode, MarketPhase, ModeProfile, QuoteData, QuoteFeed, SourceError,
    ThrottleConfig,
};
use quotefeed_mock::{ScriptController, ScriptedSource, SourceBehavior};

fn instant_profile() -> ModeProfile {
    ModeProfile {
        symbol_spacing: Duration::ZERO,
        global_spacing: Duration::ZERO,
        jitter_min: Duration::ZERO,
        jitter_max: Duration::ZERO,
        delay_cap: Duration::ZERO,
        max_batch: 64,
        batch_pause: Duration::ZERO,
    }
}

fn scripted_feed(ttl: Duration) -> (QuoteFeed, ScriptController) {
    let (source, controller) = ScriptedSource::new_with_controller();
    let feed = QuoteFeed::builder(source)
        .config(FeedConfig {
            cache_ttl: ttl,
            max_workers: 4,
            throttle: ThrottleConfig {
                normal: instant_profile(),
                fast: instant_profile(),
            },
        })
        .build()
        .unwrap();
    (feed, controller)
}

// Populate the cache for `symbol`, then wait out the short TTL so the next
// fetch misses the fresh check but still finds the old entry.
async fn seed_and_expire(feed: &QuoteFeed, symbol: &str) -> QuoteData {
    let seeded = feed.fetch_one(symbol, FetchMode::Normal).await;
    assert!(seeded.has_price());
    tokio::time::sleep(Duration::from_millis(80)).await;
    seeded
}

#[tokio::test]
async fn provider_error_serves_stale_copy() {
    let (feed, controller) = scripted_feed(Duration::from_millis(50));
    let seeded = seed_and_expire(&feed, "AAPL").await;

    controller
        .set_behavior("AAPL", SourceBehavior::Fail(SourceError::network("down")))
        .await;
    let quote = feed.fetch_one("AAPL", FetchMode::Normal).await;

    assert!(quote.stale);
    assert_eq!(quote.phase, MarketPhase::Stale);
    assert_eq!(quote.price, format!("{} (cached)", seeded.price));
    assert_eq!(quote.change, seeded.change);
}

#[tokio::test]
async fn sentinel_response_serves_stale_copy() {
    let (feed, controller) = scripted_feed(Duration::from_millis(50));
    let seeded = seed_and_expire(&feed, "MSFT").await;

    controller.set_behavior("MSFT", SourceBehavior::Unavailable).await;
    let quote = feed.fetch_one("MSFT", FetchMode::Normal).await;

    assert!(quote.stale);
    assert_eq!(quote.price, format!("{} (cached)", seeded.price));
}

#[tokio::test]
async fn error_without_cache_returns_error_record() {
    let (feed, controller) = scripted_feed(Duration::from_secs(600));

    controller
        .set_behavior("NVDA", SourceBehavior::Fail(SourceError::Blocked))
        .await;
    let quote = feed.fetch_one("NVDA", FetchMode::Normal).await;

    assert_eq!(quote.symbol, "NVDA");
    assert_eq!(quote.price, QuoteData::UNAVAILABLE);
    assert_eq!(quote.phase, MarketPhase::Error);
    assert!(quote.error.is_some());
    assert!(!quote.stale);
}

#[tokio::test]
async fn sentinel_without_cache_passes_through() {
    let (feed, controller) = scripted_feed(Duration::from_secs(600));

    controller.set_behavior("KO", SourceBehavior::Unavailable).await;
    let quote = feed.fetch_one("KO", FetchMode::Normal).await;

    assert_eq!(quote.price, QuoteData::UNAVAILABLE);
    assert!(quote.error.is_none());
    assert!(!quote.stale);
}

#[tokio::test]
async fn failure_never_overwrites_cached_value() {
    let (feed, controller) = scripted_feed(Duration::from_millis(50));
    let seeded = seed_and_expire(&feed, "AAPL").await;

    controller
        .set_behavior("AAPL", SourceBehavior::Fail(SourceError::network("down")))
        .await;
    // Two failed fetches in a row: both must fall back to the same original
    // value, proving the first failure did not replace the cached entry.
    let first = feed.fetch_one("AAPL", FetchMode::Normal).await;
    let second = feed.fetch_one("AAPL", FetchMode::Normal).await;

    assert_eq!(first.price, format!("{} (cached)", seeded.price));
    assert_eq!(second.price, first.price);
}

#[tokio::test]
async fn recovery_replaces_stale_entry() {
    let (feed, controller) = scripted_feed(Duration::from_millis(50));
    seed_and_expire(&feed, "AAPL").await;

    controller
        .set_behavior("AAPL", SourceBehavior::Fail(SourceError::Timeout))
        .await;
    let degraded = feed.fetch_one("AAPL", FetchMode::Normal).await;
    assert!(degraded.stale);

    controller.set_behavior("AAPL", SourceBehavior::Fixture).await;
    let recovered = feed.fetch_one("AAPL", FetchMode::Normal).await;

    assert!(!recovered.stale);
    assert!(recovered.has_price());
    assert_eq!(recovered.phase, MarketPhase::Open);
}
