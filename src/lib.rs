//! SignalBox - event-driven options signal pipeline
//!
//! This library ingests streaming price ticks and periodic news for a small
//! set of symbols, derives technical and sentiment features, and emits
//! trading signals through a priority-ordered event bus.

pub mod analysis;
pub mod bus;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod feeds;
pub mod monitors;
pub mod pipeline;

// Re-export commonly used types
pub use bus::{EventBus, EventHandler};
pub use config::AppConfig;
pub use engine::signal_engine::{Direction, OptionType, Signal, SignalEngine};
pub use events::{Event, EventPayload, EventPriority, EventType};

#[cfg(test)]
mod bus_tests;
#[cfg(test)]
mod config_tests;
