use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;

/// Box Method detector parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct BoxConfig {
    /// Max consolidation range as a fraction of the box low.
    #[serde(default = "default_box_size_threshold")]
    pub box_size_threshold: f64,
    #[serde(default = "default_min_consolidation_candles")]
    pub min_consolidation_candles: usize,
    /// Breakout volume must exceed box average volume times this.
    #[serde(default = "default_volume_multiplier")]
    pub volume_multiplier: f64,
    /// Retest tolerance as a fraction of the box range.
    #[serde(default = "default_retest_tolerance")]
    pub retest_tolerance: f64,
    /// Extra range beyond the box boundary for stop-loss placement.
    #[serde(default = "default_stop_loss_tolerance")]
    pub stop_loss_tolerance: f64,
    #[serde(default = "default_risk_reward_ratios")]
    pub risk_reward_ratios: Vec<f64>,
    /// Dollar risk budget per trade.
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            box_size_threshold: default_box_size_threshold(),
            min_consolidation_candles: default_min_consolidation_candles(),
            volume_multiplier: default_volume_multiplier(),
            retest_tolerance: default_retest_tolerance(),
            stop_loss_tolerance: default_stop_loss_tolerance(),
            risk_reward_ratios: default_risk_reward_ratios(),
            risk_per_trade: default_risk_per_trade(),
        }
    }
}

/// Signal engine and gating parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_sentiment_weight")]
    pub sentiment_weight: f64,
    #[serde(default = "default_technical_weight")]
    pub technical_weight: f64,
    /// Minimum confidence to emit a candidate signal.
    #[serde(default = "default_signal_threshold")]
    pub signal_threshold: f64,
    /// Cooldown between emitted signals for the same symbol.
    #[serde(default = "default_min_signal_interval_secs")]
    pub min_signal_interval_secs: u64,
    #[serde(default = "default_max_concurrent_trades")]
    pub max_concurrent_trades: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sentiment_weight: default_sentiment_weight(),
            technical_weight: default_technical_weight(),
            signal_threshold: default_signal_threshold(),
            min_signal_interval_secs: default_min_signal_interval_secs(),
            max_concurrent_trades: default_max_concurrent_trades(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BusConfig {
    /// How long stop() waits for in-flight handler tasks before abandoning.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Rolling per-symbol history capacity (price points, sentiment scores).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_news_interval_secs")]
    pub news_interval_secs: u64,
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,
    #[serde(default = "default_sentiment_keywords")]
    pub sentiment_keywords: Vec<String>,

    #[serde(rename = "box", default)]
    pub box_method: BoxConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            history_limit: default_history_limit(),
            scan_interval_secs: default_scan_interval_secs(),
            news_interval_secs: default_news_interval_secs(),
            timeframes: default_timeframes(),
            sentiment_keywords: default_sentiment_keywords(),
            box_method: BoxConfig::default(),
            engine: EngineConfig::default(),
            bus: BusConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let config: AppConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbols must not be empty".into()));
        }
        if self.engine.sentiment_weight < 0.0 || self.engine.technical_weight < 0.0 {
            return Err(ConfigError::Invalid("weights must be non-negative".into()));
        }
        if !(0.0..=1.0).contains(&self.engine.signal_threshold) {
            return Err(ConfigError::Invalid(
                "signal_threshold must be within [0, 1]".into(),
            ));
        }
        if self.box_method.min_consolidation_candles < 2 {
            return Err(ConfigError::Invalid(
                "min_consolidation_candles must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

fn default_box_size_threshold() -> f64 {
    0.02
}
fn default_min_consolidation_candles() -> usize {
    5
}
fn default_volume_multiplier() -> f64 {
    1.3
}
fn default_retest_tolerance() -> f64 {
    0.005
}
fn default_stop_loss_tolerance() -> f64 {
    0.0035
}
fn default_risk_reward_ratios() -> Vec<f64> {
    vec![2.0, 3.0, 4.0]
}
fn default_risk_per_trade() -> f64 {
    25.0
}
fn default_sentiment_weight() -> f64 {
    0.4
}
fn default_technical_weight() -> f64 {
    0.6
}
fn default_signal_threshold() -> f64 {
    0.7
}
fn default_min_signal_interval_secs() -> u64 {
    3600
}
fn default_max_concurrent_trades() -> usize {
    2
}
fn default_drain_timeout_secs() -> u64 {
    10
}
fn default_symbols() -> Vec<String> {
    vec!["QQQ".to_string(), "SPY".to_string()]
}
fn default_history_limit() -> usize {
    100
}
fn default_scan_interval_secs() -> u64 {
    1800
}
fn default_news_interval_secs() -> u64 {
    60
}
fn default_timeframes() -> Vec<String> {
    vec!["1h".to_string(), "4h".to_string(), "1d".to_string()]
}
fn default_sentiment_keywords() -> Vec<String> {
    [
        "tariffs",
        "trade war",
        "tech regulation",
        "antitrust",
        "Federal Reserve",
        "interest rates",
        "inflation",
        "AI",
        "artificial intelligence",
        "earnings",
        "revenue",
        "guidance",
        "forecast",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
