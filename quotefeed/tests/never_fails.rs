use std::time::Duration;

use quotefeed::{
    FeedConfig, FetchMode, MarketPhase, ModeProfile, QuoteData, QuoteFeed, SourceError,
    ThrottleConfig,
};
use quotefeed_mock::{ScriptController, ScriptedSource, SourceBehavior};

fn scripted_feed() -> (QuoteFeed, ScriptController) {
    let (source, controller) = ScriptedSource::new_with_controller();
    let profile = ModeProfile {
        symbol_spacing: Duration::ZERO,
        global_spacing: Duration::ZERO,
        jitter_min: Duration::ZERO,
        jitter_max: Duration::ZERO,
        delay_cap: Duration::ZERO,
        max_batch: 64,
        batch_pause: Duration::ZERO,
    };
    let feed = QuoteFeed::builder(source)
        .config(FeedConfig {
            cache_ttl: Duration::from_secs(600),
            max_workers: 4,
            throttle: ThrottleConfig {
                normal: profile.clone(),
                fast: profile,
            },
        })
        .build()
        .unwrap();
    (feed, controller)
}

#[tokio::test]
async fn mixed_outcomes_still_complete_the_batch() {
    let (feed, controller) = scripted_feed();
    controller
        .set_behavior("AAPL", SourceBehavior::Fail(SourceError::network("reset")))
        .await;
    controller.set_behavior("MSFT", SourceBehavior::Unavailable).await;

    let report = feed
        .fetch_many(&["AAPL", "MSFT", "NVDA"], FetchMode::Normal)
        .await;

    assert_eq!(report.quotes.len(), 3);

    let failed = report.quotes.get("AAPL").unwrap();
    assert_eq!(failed.phase, MarketPhase::Error);
    assert!(failed.error.is_some());

    let empty = report.quotes.get("MSFT").unwrap();
    assert_eq!(empty.price, QuoteData::UNAVAILABLE);
    assert!(empty.error.is_none());

    let good = report.quotes.get("NVDA").unwrap();
    assert!(good.has_price());
}

#[tokio::test]
async fn total_provider_failure_yields_a_record_per_symbol() {
    let (feed, controller) = scripted_feed();
    controller
        .set_fallback(SourceBehavior::Fail(SourceError::Blocked))
        .await;

    let symbols = ["AAPL", "MSFT", "NVDA", "GOOGL", "KO"];
    let report = feed.fetch_many(&symbols, FetchMode::Normal).await;

    assert_eq!(report.quotes.len(), symbols.len());
    for symbol in symbols {
        let quote = report.quotes.get(symbol).unwrap();
        assert_eq!(quote.symbol, symbol);
        assert_eq!(quote.price, QuoteData::UNAVAILABLE);
        assert!(quote.error.is_some());
    }
}

#[tokio::test]
async fn one_symbol_failure_does_not_taint_others() {
    let (feed, controller) = scripted_feed();
    controller
        .set_behavior("MSFT", SourceBehavior::Fail(SourceError::Timeout))
        .await;

    let report = feed.fetch_many(&["AAPL", "MSFT"], FetchMode::Normal).await;

    assert!(report.quotes.get("AAPL").unwrap().has_price());
    assert!(!report.quotes.get("MSFT").unwrap().has_price());
    // Only the failing symbol's record carries an error.
    assert!(report.quotes.get("AAPL").unwrap().error.is_none());
}

#[tokio::test]
async fn failed_batch_symbols_can_recover_later() {
    let (feed, controller) = scripted_feed();
    controller
        .set_behavior("AAPL", SourceBehavior::Fail(SourceError::network("down")))
        .await;

    let first = feed.fetch_many(&["AAPL"], FetchMode::Normal).await;
    assert!(!first.quotes.get("AAPL").unwrap().has_price());

    controller.set_behavior("AAPL", SourceBehavior::Fixture).await;
    let second = feed.fetch_many(&["AAPL"], FetchMode::Normal).await;

    assert!(second.quotes.get("AAPL").unwrap().has_price());
}
