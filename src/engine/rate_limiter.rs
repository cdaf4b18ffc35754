//! Per-symbol signal cooldown.
//!
//! The last-emission timestamp is updated only on successful emission, so a
//! rejected candidate never extends the cooldown.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::info;

pub struct SignalRateLimiter {
    min_interval: Duration,
    last_signals: DashMap<String, DateTime<Utc>>,
}

impl SignalRateLimiter {
    pub fn new(min_interval_secs: u64) -> Self {
        Self {
            min_interval: Duration::seconds(min_interval_secs as i64),
            last_signals: DashMap::new(),
        }
    }

    /// Whether a new signal for the symbol may be emitted at `now`.
    pub fn allow(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        match self.last_signals.get(symbol) {
            Some(last) => {
                let elapsed = now - *last;
                if elapsed < self.min_interval {
                    info!(
                        "Suppressing signal for {}: {}s since last emission (min {}s)",
                        symbol,
                        elapsed.num_seconds(),
                        self.min_interval.num_seconds()
                    );
                    false
                } else {
                    true
                }
            }
            None => true,
        }
    }

    /// Record a successful emission.
    pub fn record(&self, symbol: &str, now: DateTime<Utc>) {
        self.last_signals.insert(symbol.to_string(), now);
    }

    pub fn last_emission(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.last_signals.get(symbol).map(|t| *t)
    }
}
