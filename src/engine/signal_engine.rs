//! Multi-factor signal fusion.
//!
//! Sentiment and technical features are folded into one combined score in
//! [0, 1]; confidence is the distance from neutral rescaled to [0, 1].

use crate::analysis::boxes::{BoxAnalyzer, BreakoutDirection};
use crate::config::{BoxConfig, EngineConfig};
use crate::engine::confidence_filter::ConfidenceFilter;
use crate::events::{SentimentSummary, TechnicalSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// An accepted trade recommendation. Never mutated after creation; rejected
/// candidates are simply not propagated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub option_type: OptionType,
    pub confidence: f64,
    pub sentiment_score: f64,
    pub technical_score: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profits: Vec<f64>,
    pub position_size: Option<u64>,
    pub risk_amount: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub technical: TechnicalSnapshot,
    pub sentiment: Option<SentimentSummary>,
}

#[derive(Clone, Copy, Debug)]
pub struct SignalScores {
    pub combined: f64,
    pub sentiment: f64,
    pub technical: f64,
}

pub struct SignalEngine {
    config: EngineConfig,
    boxes: BoxAnalyzer,
    filter: ConfidenceFilter,
}

impl SignalEngine {
    pub fn new(config: EngineConfig, box_config: BoxConfig) -> Self {
        Self {
            config,
            boxes: BoxAnalyzer::new(box_config),
            filter: ConfidenceFilter,
        }
    }

    /// Fuse sentiment and technical features into one score triple. Missing
    /// inputs default to neutral (0.5).
    pub fn calculate_scores(
        &self,
        sentiment: Option<&SentimentSummary>,
        technical: &TechnicalSnapshot,
    ) -> SignalScores {
        // Sentiment input is [-1, 1]; normalize to [0, 1].
        let sentiment_score = sentiment
            .map(|s| (s.overall_score + 1.0) / 2.0)
            .unwrap_or(0.5);

        let bullish = technical.total_bullish();
        let bearish = technical.total_bearish();
        let total = bullish + bearish;
        let technical_score = if total > 0 {
            f64::from(bullish) / f64::from(total)
        } else {
            0.5
        };

        let combined = (sentiment_score * self.config.sentiment_weight
            + technical_score * self.config.technical_weight)
            .clamp(0.0, 1.0);

        SignalScores {
            combined,
            sentiment: sentiment_score,
            technical: technical_score,
        }
    }

    /// A combined score of exactly 0.5 resolves to bullish by convention.
    pub(crate) fn determine_direction(score: f64) -> (Direction, OptionType) {
        if score >= 0.5 {
            (Direction::Bullish, OptionType::Call)
        } else {
            (Direction::Bearish, OptionType::Put)
        }
    }

    /// Generate trade signals for a symbol: zero or one in practice.
    pub fn generate(
        &self,
        symbol: &str,
        sentiment: Option<&SentimentSummary>,
        technical: &TechnicalSnapshot,
    ) -> Vec<Signal> {
        info!("Generating signals for {}", symbol);

        let scores = self.calculate_scores(sentiment, technical);
        let confidence = (scores.combined - 0.5).abs() * 2.0;
        let (direction, option_type) = Self::determine_direction(scores.combined);

        if confidence < self.config.signal_threshold {
            info!(
                "Signal for {} below threshold: {:.2} < {}",
                symbol, confidence, self.config.signal_threshold
            );
            return Vec::new();
        }

        let result = self
            .filter
            .apply(symbol, direction, confidence, sentiment, technical);
        if !result.pass {
            info!(
                "Signal for {} filtered out: {}",
                symbol,
                result.reason.as_deref().unwrap_or("unknown")
            );
            return Vec::new();
        }

        // Trade levels come from the box formation when one is present.
        let mut entry_price = technical.current_price;
        let mut stop_loss = None;
        let mut take_profits = Vec::new();
        let mut position_size = None;
        let mut risk_amount = None;

        if let Some(pattern) = &technical.box_pattern {
            let is_long = pattern.direction == BreakoutDirection::Up;
            let stop = self.boxes.calculate_stop_loss(pattern.top, pattern.bottom, is_long);
            entry_price = pattern.breakout_price;
            match self.boxes.calculate_position_size(entry_price, stop) {
                Ok((contracts, risk)) => {
                    stop_loss = Some(stop);
                    take_profits = self.boxes.calculate_take_profits(entry_price, stop, is_long);
                    position_size = Some(contracts);
                    risk_amount = Some(risk);
                }
                Err(e) => {
                    // Degenerate math means no signal, never NaN/infinity.
                    warn!("Discarding signal for {}: {}", symbol, e);
                    return Vec::new();
                }
            }
        }

        let signal = Signal {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            direction,
            option_type,
            confidence,
            sentiment_score: scores.sentiment,
            technical_score: scores.technical,
            entry_price,
            stop_loss,
            take_profits,
            position_size,
            risk_amount,
            timestamp: Utc::now(),
            technical: technical.clone(),
            sentiment: sentiment.cloned(),
        };

        vec![signal]
    }
}
