//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use url::Url;

use super::Settings;
use crate::utils::errors::{AfishaError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_stats_config(&settings.stats)?;
    validate_events_config(&settings.events)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AfishaError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(AfishaError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AfishaError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate stats collector configuration
fn validate_stats_config(config: &super::StatsConfig) -> Result<()> {
    Url::parse(&config.base_url).map_err(|e| {
        AfishaError::Config(format!("Invalid stats collector base URL: {e}"))
    })?;

    if config.app_name.is_empty() {
        return Err(AfishaError::Config(
            "Stats application name is required".to_string(),
        ));
    }

    if config.timeout_ms == 0 {
        return Err(AfishaError::Config(
            "Stats timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate event lifecycle configuration
fn validate_events_config(config: &super::EventsConfig) -> Result<()> {
    if config.user_lead_hours <= 0 {
        return Err(AfishaError::Config(
            "User lead hours must be greater than 0".to_string(),
        ));
    }

    if config.publish_lead_hours <= 0 {
        return Err(AfishaError::Config(
            "Publish lead hours must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AfishaError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AfishaError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
