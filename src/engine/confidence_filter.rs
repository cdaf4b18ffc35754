//! Gatekeeper for candidate signals: rejects low-confidence, low-coverage,
//! or internally conflicting candidates. Rules run in order; the first
//! failure wins. The filter is pure, so identical inputs always yield
//! identical results.

use crate::engine::signal_engine::Direction;
use crate::events::{SentimentSummary, TechnicalSnapshot};

#[derive(Clone, Debug)]
pub struct FilterResult {
    pub pass: bool,
    pub reason: Option<String>,
}

impl FilterResult {
    fn pass() -> Self {
        Self {
            pass: true,
            reason: None,
        }
    }

    fn reject(reason: String) -> Self {
        Self {
            pass: false,
            reason: Some(reason),
        }
    }
}

pub struct ConfidenceFilter;

impl ConfidenceFilter {
    pub fn apply(
        &self,
        _symbol: &str,
        direction: Direction,
        confidence: f64,
        sentiment: Option<&SentimentSummary>,
        technical: &TechnicalSnapshot,
    ) -> FilterResult {
        // Absolute floor, independent of the engine's own threshold.
        if confidence < 0.3 {
            return FilterResult::reject(format!("Confidence too low: {:.2}", confidence));
        }

        if let Some(sentiment) = sentiment {
            if sentiment.article_count < 2 {
                return FilterResult::reject(format!(
                    "Insufficient news coverage: {} articles",
                    sentiment.article_count
                ));
            }
        }

        if Self::has_conflicting_timeframes(technical, direction) {
            return FilterResult::reject("Conflicting signals across timeframes".to_string());
        }

        FilterResult::pass()
    }

    /// A timeframe is strongly bullish when bulls outnumber bears by more
    /// than 2:1 (and vice versa). Any strong/strong or direction/strong
    /// contradiction is a conflict.
    fn has_conflicting_timeframes(technical: &TechnicalSnapshot, direction: Direction) -> bool {
        let mut has_bullish = false;
        let mut has_bearish = false;

        for summary in technical.timeframes.values() {
            let bulls = summary.bullish_signals;
            let bears = summary.bearish_signals;
            if bulls > bears * 2 {
                has_bullish = true;
            } else if bears > bulls * 2 {
                has_bearish = true;
            }
        }

        if has_bullish && has_bearish {
            return true;
        }
        if direction == Direction::Bullish && has_bearish {
            return true;
        }
        if direction == Direction::Bearish && has_bullish {
            return true;
        }

        false
    }
}
