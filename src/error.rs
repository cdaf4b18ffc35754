//! Custom error types for the signal pipeline
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Configuration / startup errors. These are fatal and surfaced from main.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Event bus errors.
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Event bus is not running")]
    NotRunning,

    #[error("Event bus is already running")]
    AlreadyRunning,

    #[error("Drain timed out after {timeout_secs}s with {outstanding} handler task(s) outstanding")]
    DrainTimeout {
        timeout_secs: u64,
        outstanding: usize,
    },
}

/// Errors from detector and scoring math.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Zero risk: entry price {entry} equals stop loss")]
    ZeroRisk { entry: f64 },

    #[error("Not enough data for {symbol}: have {count}, need {required}")]
    InsufficientData {
        symbol: String,
        count: usize,
        required: usize,
    },
}

/// Handler-local pipeline errors. Caught and logged by the dispatch loop,
/// never propagated to sibling handlers.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unexpected payload for handler {handler}: got {got}")]
    UnexpectedPayload { handler: String, got: String },

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
}
