//! Price and news producers. Each polls its collaborator on an interval and
//! publishes events onto the bus from its own task. A failed poll substitutes
//! nothing and never raises into the dispatch loop.

use crate::bus::EventBus;
use crate::events::{Event, EventPayload, EventPriority};
use crate::feeds::{MarketDataSource, NewsSource};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PriceMonitor {
    source: Arc<dyn MarketDataSource>,
    bus: EventBus,
    interval: Duration,
    last_prices: Arc<DashMap<String, f64>>,
    running: Arc<AtomicBool>,
}

impl PriceMonitor {
    pub fn new(source: Arc<dyn MarketDataSource>, bus: EventBus, interval: Duration) -> Self {
        Self {
            source,
            bus,
            interval,
            last_prices: Arc::new(DashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self, symbols: Vec<String>) {
        self.running.store(true, Ordering::SeqCst);
        info!("Starting price monitor for symbols: {:?}", symbols);

        let source = self.source.clone();
        let bus = self.bus.clone();
        let interval = self.interval;
        let last_prices = self.last_prices.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                if source.is_market_open().await {
                    for symbol in &symbols {
                        match source.latest_tick(symbol).await {
                            Some(tick) => {
                                let change = last_prices
                                    .get(symbol)
                                    .map(|last| (tick.price - *last) / *last)
                                    .unwrap_or(0.0);
                                last_prices.insert(symbol.clone(), tick.price);
                                debug!(
                                    "Publishing price update for {}: ${:.2} (change {:.2}%)",
                                    symbol,
                                    tick.price,
                                    change * 100.0
                                );
                                bus.publish(Event::price_update(
                                    symbol,
                                    tick.price,
                                    tick.volume,
                                    change,
                                    "price_monitor",
                                ));
                            }
                            None => {
                                warn!("No tick for {}; keeping last known price", symbol);
                            }
                        }
                    }
                } else {
                    debug!("Market closed; skipping price scan");
                }
                tokio::time::sleep(interval).await;
            }
            info!("Price monitor stopped");
        });
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

pub struct NewsMonitor {
    source: Arc<dyn NewsSource>,
    bus: EventBus,
    interval: Duration,
    seen_headlines: Arc<DashMap<String, DashSet<String>>>,
    running: Arc<AtomicBool>,
}

impl NewsMonitor {
    pub fn new(source: Arc<dyn NewsSource>, bus: EventBus, interval: Duration) -> Self {
        Self {
            source,
            bus,
            interval,
            seen_headlines: Arc::new(DashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self, symbols: Vec<String>) {
        self.running.store(true, Ordering::SeqCst);
        info!("Starting news monitor for symbols: {:?}", symbols);

        let source = self.source.clone();
        let bus = self.bus.clone();
        let interval = self.interval;
        let seen = self.seen_headlines.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                for symbol in &symbols {
                    let articles = source.recent_articles(symbol).await;
                    let seen_for_symbol = seen.entry(symbol.clone()).or_default();
                    for article in articles {
                        if !seen_for_symbol.insert(article.headline.clone()) {
                            continue;
                        }
                        debug!("Publishing news update for {}", symbol);
                        bus.publish(Event::new(
                            EventPayload::NewsUpdate {
                                symbol: symbol.clone(),
                                article,
                            },
                            EventPriority::Medium,
                            "news_monitor",
                        ));
                    }
                }
                tokio::time::sleep(interval).await;
            }
            info!("News monitor stopped");
        });
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
