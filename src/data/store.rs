//! Per-symbol mutable state, owned here and passed by handle.
//!
//! Rolling histories are bounded FIFO queues; the active-trade set is capped
//! by the max-concurrency invariant. Handlers for the same event may run
//! concurrently, so every map is behind its own lock.

use crate::events::{NewsArticle, SentimentSummary};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug)]
pub struct PricePoint {
    pub price: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct ActiveTrade {
    pub signal_id: String,
    pub opened_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SymbolStore {
    prices: Arc<DashMap<String, VecDeque<PricePoint>>>,
    articles: Arc<DashMap<String, VecDeque<NewsArticle>>>,
    sentiment: Arc<DashMap<String, SentimentSummary>>,
    // Plain mutex so the capacity check and insert are one atomic step.
    active_trades: Arc<Mutex<HashMap<String, ActiveTrade>>>,
    limit: usize,
}

impl SymbolStore {
    pub fn new(limit: usize) -> Self {
        Self {
            prices: Arc::new(DashMap::new()),
            articles: Arc::new(DashMap::new()),
            sentiment: Arc::new(DashMap::new()),
            active_trades: Arc::new(Mutex::new(HashMap::new())),
            limit,
        }
    }

    pub fn record_price(&self, symbol: &str, point: PricePoint) {
        let mut queue = self.prices.entry(symbol.to_string()).or_default();
        if queue.len() >= self.limit {
            queue.pop_front();
        }
        queue.push_back(point);
    }

    pub fn price_history(&self, symbol: &str) -> Vec<PricePoint> {
        self.prices
            .get(symbol)
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn latest_price(&self, symbol: &str) -> Option<PricePoint> {
        self.prices.get(symbol).and_then(|q| q.back().copied())
    }

    pub fn record_article(&self, symbol: &str, article: NewsArticle) {
        let mut queue = self.articles.entry(symbol.to_string()).or_default();
        if queue.len() >= self.limit {
            queue.pop_front();
        }
        queue.push_back(article);
    }

    pub fn article_history(&self, symbol: &str) -> Vec<NewsArticle> {
        self.articles
            .get(symbol)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_sentiment(&self, symbol: &str, summary: SentimentSummary) {
        self.sentiment.insert(symbol.to_string(), summary);
    }

    pub fn latest_sentiment(&self, symbol: &str) -> Option<SentimentSummary> {
        self.sentiment.get(symbol).map(|s| s.clone())
    }

    /// Open a trade slot for the symbol. Fails when the symbol already has an
    /// open trade or the concurrency cap is reached.
    pub fn try_open_trade(&self, symbol: &str, trade: ActiveTrade, max_concurrent: usize) -> bool {
        let mut trades = self.active_trades.lock().unwrap();
        if trades.contains_key(symbol) || trades.len() >= max_concurrent {
            return false;
        }
        trades.insert(symbol.to_string(), trade);
        true
    }

    pub fn has_active_trade(&self, symbol: &str) -> bool {
        self.active_trades.lock().unwrap().contains_key(symbol)
    }

    pub fn close_trade(&self, symbol: &str) -> Option<ActiveTrade> {
        self.active_trades.lock().unwrap().remove(symbol)
    }

    pub fn active_trade_count(&self) -> usize {
        self.active_trades.lock().unwrap().len()
    }
}
