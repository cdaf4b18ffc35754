//! Integration tests for the signal pipeline.
//! These tests run the real dispatch loop with every handler registered.

use async_trait::async_trait;
use signalbox::config::AppConfig;
use signalbox::data::store::{PricePoint, SymbolStore};
use signalbox::engine::trade_formatter::FormattedSignal;
use signalbox::events::{
    Event, EventPayload, EventPriority, SentimentSummary, TechnicalSnapshot, TimeframeSummary,
};
use signalbox::feeds::NotificationSink;
use signalbox::pipeline::register_pipeline;
use signalbox::EventBus;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RecordingSink {
    signals: Mutex<Vec<FormattedSignal>>,
    statuses: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
        }
    }

    fn signal_count(&self) -> usize {
        self.signals.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_signal(&self, signal: &FormattedSignal) {
        self.signals.lock().unwrap().push(signal.clone());
    }

    async fn send_status(&self, status: &str, message: &str) {
        self.statuses
            .lock()
            .unwrap()
            .push((status.to_string(), message.to_string()));
    }
}

fn pipeline() -> (EventBus, SymbolStore, Arc<RecordingSink>) {
    let bus = EventBus::new(Duration::from_secs(2));
    let store = SymbolStore::new(100);
    let sink = Arc::new(RecordingSink::new());
    register_pipeline(&bus, &store, &AppConfig::default(), sink.clone());
    (bus, store, sink)
}

fn trigger_event(symbol: &str, bullish: u32, bearish: u32) -> Event {
    let mut timeframes = BTreeMap::new();
    timeframes.insert(
        "1h".to_string(),
        TimeframeSummary {
            bullish_signals: bullish,
            bearish_signals: bearish,
            neutral_signals: 0,
        },
    );
    Event::new(
        EventPayload::TradingSignal {
            symbol: symbol.to_string(),
            technical: TechnicalSnapshot {
                current_price: 100.0,
                timeframes,
                box_pattern: None,
            },
            sentiment: Some(SentimentSummary {
                overall_score: 0.6,
                label: "positive".to_string(),
                article_count: 2,
                keyword_matches: HashMap::new(),
            }),
        },
        EventPriority::High,
        "integration_test",
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// Strongly directional trigger rides the bus all the way to the sink.
#[tokio::test]
async fn test_trigger_to_notification_flow() {
    let (bus, store, sink) = pipeline();
    bus.start().unwrap();

    bus.publish(trigger_event("QQQ", 9, 1));
    settle().await;

    assert_eq!(sink.signal_count(), 1);
    assert!(store.has_active_trade("QQQ"));
    {
        let signals = sink.signals.lock().unwrap();
        assert_eq!(signals[0].signal.symbol, "QQQ");
        assert!(signals[0].signal.confidence >= 0.7);
    }

    bus.stop().await.unwrap();
}

/// Moderately directional trigger falls below the confidence threshold.
#[tokio::test]
async fn test_weak_trigger_emits_nothing() {
    let (bus, store, sink) = pipeline();
    bus.start().unwrap();

    bus.publish(trigger_event("QQQ", 5, 1));
    settle().await;

    assert_eq!(sink.signal_count(), 0);
    assert!(!store.has_active_trade("QQQ"));

    bus.stop().await.unwrap();
}

/// Repeated triggers for one symbol collapse to a single notification.
#[tokio::test]
async fn test_duplicate_triggers_are_deduplicated() {
    let (bus, _store, sink) = pipeline();
    bus.start().unwrap();

    bus.publish(trigger_event("QQQ", 9, 1));
    bus.publish(trigger_event("QQQ", 9, 1));
    bus.publish(trigger_event("QQQ", 9, 1));
    settle().await;

    assert_eq!(sink.signal_count(), 1);

    bus.stop().await.unwrap();
}

/// A price tick completing a box formation publishes a trigger, updates the
/// store, and still stays quiet when the fused score is not strong enough.
#[tokio::test]
async fn test_price_tick_drives_analysis() {
    let (bus, store, sink) = pipeline();

    // Seed a tight consolidation so the next tick completes the box window.
    for (i, price) in [100.0_f64, 100.1, 99.9, 100.2, 100.0].iter().enumerate() {
        store.record_price(
            "QQQ",
            PricePoint {
                price: *price,
                volume: 1_000_000.0,
                timestamp: chrono::Utc::now() - chrono::Duration::hours(5 - i as i64),
            },
        );
    }

    bus.start().unwrap();
    bus.publish(Event::price_update(
        "QQQ",
        103.0,
        2_000_000.0,
        0.028,
        "integration_test",
    ));
    settle().await;

    assert_eq!(store.price_history("QQQ").len(), 6);
    // Box alone gives a neutral technical score, so no signal is emitted.
    assert_eq!(sink.signal_count(), 0);
    assert!(!store.has_active_trade("QQQ"));

    bus.stop().await.unwrap();
}

/// News flows through sentiment aggregation into the store.
#[tokio::test]
async fn test_news_flows_into_stored_sentiment() {
    let (bus, store, _sink) = pipeline();
    bus.start().unwrap();

    for headline in ["Earnings beat expectations", "Guidance raised"] {
        bus.publish(Event::new(
            EventPayload::NewsUpdate {
                symbol: "QQQ".to_string(),
                article: signalbox::events::NewsArticle {
                    headline: headline.to_string(),
                    sentiment: 0.6,
                },
            },
            EventPriority::Medium,
            "integration_test",
        ));
    }
    settle().await;

    assert_eq!(store.article_history("QQQ").len(), 2);
    let sentiment = store.latest_sentiment("QQQ").expect("sentiment stored");
    assert_eq!(sentiment.article_count, 2);
    assert!((sentiment.overall_score - 0.6).abs() < 1e-9);

    bus.stop().await.unwrap();
}

/// Status events reach the notification sink, and the bus shuts down cleanly.
#[tokio::test]
async fn test_status_flow_and_clean_shutdown() {
    let (bus, _store, sink) = pipeline();
    bus.start().unwrap();

    bus.publish(Event::new(
        EventPayload::StatusUpdate {
            status: "started".to_string(),
            message: "pipeline online".to_string(),
        },
        EventPriority::Low,
        "integration_test",
    ));
    settle().await;

    {
        let statuses = sink.statuses.lock().unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].0, "started");
    }

    bus.stop().await.unwrap();
    // A second stop is an error, not a hang.
    assert!(bus.stop().await.is_err());
}

/// Concurrent publishers never panic or lose the dispatch loop.
#[tokio::test]
async fn test_concurrent_publishing() {
    let (bus, _store, sink) = pipeline();
    bus.start().unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let bus = bus.clone();
        handles.push(tokio::spawn(async move {
            for j in 0..10 {
                bus.publish(Event::new(
                    EventPayload::StatusUpdate {
                        status: "tick".to_string(),
                        message: format!("publisher {} message {}", i, j),
                    },
                    EventPriority::Low,
                    "integration_test",
                ));
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    settle().await;

    assert_eq!(sink.statuses.lock().unwrap().len(), 100);

    bus.stop().await.unwrap();
}
