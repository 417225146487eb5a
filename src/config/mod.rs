//! Configuration module
//!
//! Application settings loading and validation.

pub mod settings;
pub mod validation;

pub use settings::{DatabaseConfig, EventsConfig, LoggingConfig, Settings, StatsConfig};
