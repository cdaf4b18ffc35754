pub mod confidence_filter;
pub mod rate_limiter;
pub mod signal_engine;
pub mod trade_formatter;
