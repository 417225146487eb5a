//! Afisha event platform core
//!
//! Business core of an event-listing platform: the event lifecycle state
//! machine, the participation-request admission workflow with capacity
//! enforcement, and the enrichment pipeline that composes events with
//! confirmed-request counts and view statistics from a separate stats
//! microservice. HTTP routing lives in a separate edge module.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AfishaError, ErrorKind, Result};

// Re-export main components for easy access
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
