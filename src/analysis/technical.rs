//! Technical feature producer: rolling-window indicator summaries per
//! timeframe plus Box Method detection.

use crate::analysis::boxes::BoxAnalyzer;
use crate::analysis::indicators::{
    bollinger_bands, macd_histogram, rsi, BOLLINGER_PERIOD, RSI_PERIOD,
};
use crate::config::BoxConfig;
use crate::data::store::PricePoint;
use crate::error::AnalysisError;
use crate::events::{TechnicalSnapshot, TimeframeSummary};
use std::collections::BTreeMap;
use tracing::debug;

pub struct TechnicalAnalyzer {
    boxes: BoxAnalyzer,
    timeframes: Vec<String>,
}

impl TechnicalAnalyzer {
    pub fn new(box_config: BoxConfig, timeframes: Vec<String>) -> Self {
        Self {
            boxes: BoxAnalyzer::new(box_config),
            timeframes,
        }
    }

    /// Analyze the rolling window for one symbol.
    pub fn analyze(
        &self,
        symbol: &str,
        history: &[PricePoint],
    ) -> Result<TechnicalSnapshot, AnalysisError> {
        if history.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                symbol: symbol.to_string(),
                count: history.len(),
                required: 2,
            });
        }

        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let volumes: Vec<f64> = history.iter().map(|p| p.volume).collect();
        let timestamps: Vec<_> = history.iter().map(|p| p.timestamp).collect();
        let current_price = prices[prices.len() - 1];

        let mut timeframes = BTreeMap::new();
        for timeframe in &self.timeframes {
            let sampled = sample_for_timeframe(&prices, stride_for(timeframe));
            let summary = timeframe_summary(&sampled, current_price);
            debug!(
                "{} {}: bull={} bear={} neutral={}",
                symbol, timeframe, summary.bullish_signals, summary.bearish_signals,
                summary.neutral_signals
            );
            timeframes.insert(timeframe.clone(), summary);
        }

        let box_pattern = self.boxes.detect(&prices, &volumes, &timestamps);

        Ok(TechnicalSnapshot {
            current_price,
            timeframes,
            box_pattern,
        })
    }

    /// Whether a snapshot is worth turning into a trading-signal event:
    /// either a box breakout, or at least one timeframe with two or more
    /// same-direction indicator signals.
    pub fn is_significant(&self, snapshot: &TechnicalSnapshot) -> bool {
        if snapshot.box_pattern.is_some() {
            return true;
        }
        snapshot
            .timeframes
            .values()
            .any(|t| t.bullish_signals >= 2 || t.bearish_signals >= 2)
    }
}

/// The rolling window holds the base-interval candles; coarser timeframes
/// are derived by striding so the most recent candle is always included.
fn stride_for(timeframe: &str) -> usize {
    let (digits, unit): (String, String) = timeframe.chars().partition(|c| c.is_ascii_digit());
    let n: usize = digits.parse().unwrap_or(1).max(1);
    match unit.as_str() {
        "d" => n * 24,
        _ => n,
    }
}

fn sample_for_timeframe(prices: &[f64], stride: usize) -> Vec<f64> {
    if stride <= 1 {
        return prices.to_vec();
    }
    let mut sampled: Vec<f64> = prices.iter().rev().step_by(stride).copied().collect();
    sampled.reverse();
    sampled
}

fn timeframe_summary(prices: &[f64], current_price: f64) -> TimeframeSummary {
    let mut summary = TimeframeSummary::default();

    if let Some(rsi) = rsi(prices, RSI_PERIOD) {
        if rsi < 30.0 {
            summary.bullish_signals += 1;
        } else if rsi > 70.0 {
            summary.bearish_signals += 1;
        } else {
            summary.neutral_signals += 1;
        }
    }

    if let Some(hist) = macd_histogram(prices) {
        if hist > 0.0 {
            summary.bullish_signals += 1;
        } else if hist < 0.0 {
            summary.bearish_signals += 1;
        } else {
            summary.neutral_signals += 1;
        }
    }

    if let Some(bands) = bollinger_bands(prices, BOLLINGER_PERIOD) {
        let upper_gap = bands.upper - bands.middle;
        let lower_gap = bands.middle - bands.lower;
        if lower_gap > 0.0 && (current_price - bands.lower).abs() < lower_gap * 0.1 {
            summary.bullish_signals += 1;
        } else if upper_gap > 0.0 && (current_price - bands.upper).abs() < upper_gap * 0.1 {
            summary.bearish_signals += 1;
        } else {
            summary.neutral_signals += 1;
        }
    }

    summary
}
