use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::analysis::boxes::BoxPattern;

/// Priority levels for events. Higher priority dequeues first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for EventPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventPriority::Low => write!(f, "LOW"),
            EventPriority::Medium => write!(f, "MEDIUM"),
            EventPriority::High => write!(f, "HIGH"),
            EventPriority::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Tag enum used as the handler registry key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    PriceUpdate,
    NewsUpdate,
    SentimentUpdate,
    TradingSignal,
    StatusUpdate,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::PriceUpdate => write!(f, "price_update"),
            EventType::NewsUpdate => write!(f, "news_update"),
            EventType::SentimentUpdate => write!(f, "sentiment_update"),
            EventType::TradingSignal => write!(f, "trading_signal"),
            EventType::StatusUpdate => write!(f, "status_update"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsArticle {
    pub headline: String,
    /// Sentiment score in [-1, 1] as scored by the news collaborator.
    pub sentiment: f64,
}

/// Per-symbol sentiment summary supplied by the news/sentiment side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Overall score in [-1, 1].
    pub overall_score: f64,
    pub label: String,
    pub article_count: usize,
    pub keyword_matches: HashMap<String, usize>,
}

/// Bull/bear/neutral signal counts for one timeframe.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TimeframeSummary {
    pub bullish_signals: u32,
    pub bearish_signals: u32,
    pub neutral_signals: u32,
}

/// Technical analysis output for one symbol across timeframes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub current_price: f64,
    pub timeframes: BTreeMap<String, TimeframeSummary>,
    pub box_pattern: Option<BoxPattern>,
}

impl TechnicalSnapshot {
    pub fn total_bullish(&self) -> u32 {
        self.timeframes.values().map(|t| t.bullish_signals).sum()
    }

    pub fn total_bearish(&self) -> u32 {
        self.timeframes.values().map(|t| t.bearish_signals).sum()
    }
}

/// Typed payload, one variant per event type.
#[derive(Clone, Debug)]
pub enum EventPayload {
    PriceUpdate {
        symbol: String,
        price: f64,
        volume: f64,
        /// Fractional change since the previous tick.
        change: f64,
    },
    NewsUpdate {
        symbol: String,
        article: NewsArticle,
    },
    SentimentUpdate {
        symbol: String,
        summary: SentimentSummary,
    },
    TradingSignal {
        symbol: String,
        technical: TechnicalSnapshot,
        sentiment: Option<SentimentSummary>,
    },
    StatusUpdate {
        status: String,
        message: String,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::PriceUpdate { .. } => EventType::PriceUpdate,
            EventPayload::NewsUpdate { .. } => EventType::NewsUpdate,
            EventPayload::SentimentUpdate { .. } => EventType::SentimentUpdate,
            EventPayload::TradingSignal { .. } => EventType::TradingSignal,
            EventPayload::StatusUpdate { .. } => EventType::StatusUpdate,
        }
    }
}

/// Unit of work on the bus. Immutable after publish.
#[derive(Clone, Debug)]
pub struct Event {
    pub payload: EventPayload,
    pub priority: EventPriority,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl Event {
    pub fn new(payload: EventPayload, priority: EventPriority, source: &str) -> Self {
        Self {
            payload,
            priority,
            timestamp: Utc::now(),
            source: source.to_string(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// Price ticks with a move over 2% are promoted to High priority.
    pub fn price_update(symbol: &str, price: f64, volume: f64, change: f64, source: &str) -> Self {
        let priority = if change.abs() > 0.02 {
            EventPriority::High
        } else {
            EventPriority::Medium
        };
        Self::new(
            EventPayload::PriceUpdate {
                symbol: symbol.to_string(),
                price,
                volume,
                change,
            },
            priority,
            source,
        )
    }
}

// Queue ordering compares (priority, timestamp) only; payload and source are
// deliberately excluded, so two distinct events can compare equal. Downstream
// dedup behavior relies on this, do not widen the comparison.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.timestamp == other.timestamp
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap order: higher priority first, then FIFO by timestamp
        // (an earlier timestamp ranks greater within the same priority).
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.timestamp.cmp(&self.timestamp))
    }
}
