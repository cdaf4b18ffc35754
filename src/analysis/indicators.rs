//! Technical indicators over closing-price series.
//!
//! All functions return `None` when the series is too short, and guard the
//! degenerate denominators (flat series, zero average loss) explicitly.

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;

#[derive(Clone, Copy, Debug)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average seeded with the first value (recursive form,
/// alpha = 2 / (span + 1)).
pub fn ema(values: &[f64], span: usize) -> Option<f64> {
    if span == 0 || values.is_empty() {
        return None;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current = values[0];
    for value in &values[1..] {
        current = alpha * value + (1.0 - alpha) * current;
    }
    Some(current)
}

/// Relative Strength Index over the trailing `period` deltas.
///
/// A series with no losses saturates at 100, no gains at 0, and a perfectly
/// flat series reads neutral (50) instead of dividing by zero.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = prices
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect();
    let tail = &deltas[deltas.len() - period..];

    let avg_gain: f64 = tail.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 = -tail.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return Some(50.0);
        }
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD histogram: (EMA12 - EMA26) minus its EMA9 signal line.
pub fn macd_histogram(prices: &[f64]) -> Option<f64> {
    if prices.len() < MACD_SLOW {
        return None;
    }

    // Build the MACD line point-by-point so the signal EMA sees a series.
    let mut macd_line = Vec::with_capacity(prices.len());
    for end in 1..=prices.len() {
        let fast = ema(&prices[..end], MACD_FAST)?;
        let slow = ema(&prices[..end], MACD_SLOW)?;
        macd_line.push(fast - slow);
    }

    let signal = ema(&macd_line, MACD_SIGNAL)?;
    let macd = *macd_line.last()?;
    Some(macd - signal)
}

pub fn bollinger_bands(prices: &[f64], period: usize) -> Option<BollingerBands> {
    if period < 2 || prices.len() < period {
        return None;
    }
    let middle = sma(prices, period)?;
    let tail = &prices[prices.len() - period..];
    // Sample standard deviation, matching the usual rolling-std convention.
    let variance =
        tail.iter().map(|p| (p - middle).powi(2)).sum::<f64>() / (period as f64 - 1.0);
    let std = variance.sqrt();
    Some(BollingerBands {
        upper: middle + 2.0 * std,
        middle,
        lower: middle - 2.0 * std,
    })
}
