//! Interfaces to external collaborators. The core only sees these traits;
//! real network clients live behind them and are out of scope here.

use crate::data::store::PricePoint;
use crate::engine::trade_formatter::FormattedSignal;
use crate::events::NewsArticle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

/// Market-data collaborator: price ticks, bounded history, market hours.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn latest_tick(&self, symbol: &str) -> Option<PriceTick>;
    async fn history(&self, symbol: &str, limit: usize) -> Vec<PricePoint>;
    async fn is_market_open(&self) -> bool;
}

/// News collaborator: recent scored articles per symbol.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn recent_articles(&self, symbol: &str) -> Vec<NewsArticle>;
}

/// Notification collaborator: accepted signals and pipeline status.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_signal(&self, signal: &FormattedSignal);
    async fn send_status(&self, status: &str, message: &str);
}

/// Default sink that writes notifications to the log.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send_signal(&self, signal: &FormattedSignal) {
        info!("📣 Trade signal:\n{}\n{}", signal.summary, signal.details);
        match serde_json::to_string(&signal.signal) {
            Ok(json) => debug!("signal payload: {}", json),
            Err(e) => debug!("signal payload not serializable: {}", e),
        }
    }

    async fn send_status(&self, status: &str, message: &str) {
        info!("📡 Status [{}]: {}", status, message);
    }
}

/// Random-walk feed for development runs, so the binary works without
/// market-data credentials.
pub struct SimFeed {
    last_prices: DashMap<String, f64>,
}

impl SimFeed {
    pub fn new() -> Self {
        Self {
            last_prices: DashMap::new(),
        }
    }

    fn base_price(symbol: &str) -> f64 {
        match symbol {
            "QQQ" => 450.0,
            "SPY" => 520.0,
            _ => 100.0,
        }
    }

    fn next_price(&self, symbol: &str) -> f64 {
        let mut rng = rand::thread_rng();
        let mut entry = self
            .last_prices
            .entry(symbol.to_string())
            .or_insert_with(|| Self::base_price(symbol));
        let step: f64 = rng.gen_range(-0.005..0.005);
        *entry *= 1.0 + step;
        *entry
    }
}

impl Default for SimFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for SimFeed {
    async fn latest_tick(&self, symbol: &str) -> Option<PriceTick> {
        let mut rng = rand::thread_rng();
        Some(PriceTick {
            symbol: symbol.to_string(),
            price: self.next_price(symbol),
            volume: rng.gen_range(5_000_000.0..15_000_000.0),
            timestamp: Utc::now(),
        })
    }

    async fn history(&self, symbol: &str, limit: usize) -> Vec<PricePoint> {
        let mut rng = rand::thread_rng();
        let mut price = Self::base_price(symbol);
        (0..limit)
            .map(|_| {
                price *= 1.0 + rng.gen_range(-0.005..0.005);
                PricePoint {
                    price,
                    volume: rng.gen_range(5_000_000.0..15_000_000.0),
                    timestamp: Utc::now(),
                }
            })
            .collect()
    }

    async fn is_market_open(&self) -> bool {
        true
    }
}

#[async_trait]
impl NewsSource for SimFeed {
    async fn recent_articles(&self, symbol: &str) -> Vec<NewsArticle> {
        let mut rng = rand::thread_rng();
        vec![NewsArticle {
            headline: format!("{} earnings guidance in focus", symbol),
            sentiment: rng.gen_range(-0.5..0.5),
        }]
    }
}
