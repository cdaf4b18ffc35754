//! Box Method pattern detection
//!
//! A "box" is a tight price consolidation later broken by a high-volume move.
//! Detection slides a fixed window over the series; all but the last candle
//! form the box, the last candle is the breakout candidate.

use crate::config::BoxConfig;
use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakoutDirection {
    Up,
    Down,
}

impl std::fmt::Display for BreakoutDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakoutDirection::Up => write!(f, "UP"),
            BreakoutDirection::Down => write!(f, "DOWN"),
        }
    }
}

/// A detected consolidation-then-breakout formation.
///
/// Invariants: `top > bottom` and `(top - bottom) / bottom` does not exceed
/// the configured box size threshold.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoxPattern {
    pub top: f64,
    pub bottom: f64,
    pub breakout_price: f64,
    pub breakout_volume: f64,
    pub direction: BreakoutDirection,
}

pub struct BoxAnalyzer {
    config: BoxConfig,
}

impl BoxAnalyzer {
    pub fn new(config: BoxConfig) -> Self {
        Self { config }
    }

    /// Detect a valid box formation in the price series.
    ///
    /// Scans windows of `min_consolidation_candles + 1` candles from the
    /// earliest to the most recent; the earliest qualifying window wins even
    /// if a later one would also qualify.
    pub fn detect(
        &self,
        prices: &[f64],
        volumes: &[f64],
        timestamps: &[DateTime<Utc>],
    ) -> Option<BoxPattern> {
        let window_size = self.config.min_consolidation_candles + 1;
        if prices.len() < window_size || volumes.len() < prices.len() {
            debug!(
                "Not enough candles for box detection. Need {}, got {}",
                window_size,
                prices.len()
            );
            return None;
        }

        for i in 0..=(prices.len() - window_size) {
            let window_prices = &prices[i..i + window_size];
            let window_volumes = &volumes[i..i + window_size];

            // Consolidation candles exclude the last (breakout) candle.
            let box_prices = &window_prices[..window_size - 1];
            let box_volumes = &window_volumes[..window_size - 1];

            let box_high = box_prices.iter().copied().fold(f64::MIN, f64::max);
            let box_low = box_prices.iter().copied().fold(f64::MAX, f64::min);
            if box_low <= 0.0 || box_high <= box_low {
                continue;
            }
            let box_range = (box_high - box_low) / box_low;

            debug!(
                "Analyzing potential box at {:?}: range={:.1}%, high={:.2}, low={:.2}",
                timestamps.get(i),
                box_range * 100.0,
                box_high,
                box_low
            );

            if box_range > self.config.box_size_threshold {
                debug!(
                    "Box range {:.1}% exceeds threshold {:.1}%",
                    box_range * 100.0,
                    self.config.box_size_threshold * 100.0
                );
                continue;
            }

            let avg_volume: f64 = box_volumes.iter().sum::<f64>() / box_volumes.len() as f64;
            let breakout_price = window_prices[window_size - 1];
            let breakout_volume = window_volumes[window_size - 1];

            let is_breakout_up = breakout_price > box_high;
            let is_breakout_down = breakout_price < box_low;
            let has_volume = breakout_volume > avg_volume * self.config.volume_multiplier;

            if (is_breakout_up || is_breakout_down) && has_volume {
                let direction = if is_breakout_up {
                    BreakoutDirection::Up
                } else {
                    BreakoutDirection::Down
                };
                info!(
                    "Box detected: range={:.1}%, volume increase={:.1}x, direction={}",
                    box_range * 100.0,
                    breakout_volume / avg_volume,
                    direction
                );
                return Some(BoxPattern {
                    top: box_high,
                    bottom: box_low,
                    breakout_price,
                    breakout_volume,
                    direction,
                });
            }
        }

        None
    }

    /// Stop loss just outside the box boundary, padded by a fraction of the
    /// box range.
    pub fn calculate_stop_loss(&self, box_top: f64, box_bottom: f64, is_long: bool) -> f64 {
        let box_range = box_top - box_bottom;
        let additional_range = box_range * self.config.stop_loss_tolerance;

        if is_long {
            box_bottom - additional_range
        } else {
            box_top + additional_range
        }
    }

    /// Take-profit levels at each configured risk:reward ratio.
    pub fn calculate_take_profits(&self, entry_price: f64, stop_loss: f64, is_long: bool) -> Vec<f64> {
        let risk = (entry_price - stop_loss).abs();
        self.config
            .risk_reward_ratios
            .iter()
            .map(|ratio| {
                if is_long {
                    entry_price + risk * ratio
                } else {
                    entry_price - risk * ratio
                }
            })
            .collect()
    }

    /// Contracts affordable within the risk budget, plus the budget itself.
    /// A zero distance between entry and stop is a degenerate trade and is
    /// reported as an error rather than dividing by zero.
    pub fn calculate_position_size(
        &self,
        entry_price: f64,
        stop_loss: f64,
    ) -> Result<(u64, f64), AnalysisError> {
        let price_risk = (entry_price - stop_loss).abs();
        if price_risk == 0.0 {
            return Err(AnalysisError::ZeroRisk { entry: entry_price });
        }
        let num_contracts = (self.config.risk_per_trade / price_risk).floor() as u64;
        Ok((num_contracts, self.config.risk_per_trade))
    }

    /// True if a retest of the box stays within tolerance of the boundary.
    pub fn validate_retest(&self, current_price: f64, box_top: f64, box_bottom: f64) -> bool {
        let box_range = box_top - box_bottom;
        let tolerance = box_range * self.config.retest_tolerance;

        if current_price > box_top {
            current_price - box_top <= tolerance
        } else if current_price < box_bottom {
            box_bottom - current_price <= tolerance
        } else {
            false
        }
    }
}
