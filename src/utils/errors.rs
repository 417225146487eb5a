//! Error handling for Afisha
//!
//! This module defines the main error types used throughout the application
//! and the mapping from domain failures to API-level outcome classes.

use thiserror::Error;

/// Main error type for the Afisha application
#[derive(Error, Debug)]
pub enum AfishaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stats collector error: {0}")]
    Stats(#[from] StatsError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Category not found: {category_id}")]
    CategoryNotFound { category_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Participation request not found: {request_id}")]
    RequestNotFound { request_id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stats collector specific errors
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Stats request failed: {0}")]
    RequestFailed(String),

    #[error("Stats request timed out")]
    Timeout,

    #[error("Invalid stats response: {0}")]
    InvalidResponse(String),

    #[error("Stats collector unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Afisha operations
pub type Result<T> = std::result::Result<T, AfishaError>;

/// Result type alias for stats collector calls
pub type StatsResult<T> = std::result::Result<T, StatsError>;

/// Outcome classes surfaced to the API boundary.
///
/// The web layer maps these to HTTP statuses: `NotFound` -> 404,
/// `Conflict` -> 409, `Validation` -> 400, `Internal` -> 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl AfishaError {
    /// Classify the error for the API boundary
    pub fn kind(&self) -> ErrorKind {
        match self {
            AfishaError::UserNotFound { .. }
            | AfishaError::CategoryNotFound { .. }
            | AfishaError::EventNotFound { .. }
            | AfishaError::RequestNotFound { .. } => ErrorKind::NotFound,
            AfishaError::Conflict(_) => ErrorKind::Conflict,
            AfishaError::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// Check if the error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AfishaError::Stats(_) | AfishaError::Http(_) | AfishaError::Io(_)
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "NOT_FOUND"),
            ErrorKind::Conflict => write!(f, "CONFLICT"),
            ErrorKind::Validation => write!(f, "VALIDATION"),
            ErrorKind::Internal => write!(f, "INTERNAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_api_kinds() {
        assert_eq!(
            AfishaError::EventNotFound { event_id: 7 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AfishaError::RequestNotFound { request_id: 1 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AfishaError::Conflict("limit reached".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AfishaError::Validation("date too soon".to_string()).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        assert_eq!(
            AfishaError::Config("missing url".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            AfishaError::Stats(StatsError::Timeout).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_stats_failures_are_recoverable() {
        assert!(AfishaError::Stats(StatsError::ServiceUnavailable).is_recoverable());
        assert!(!AfishaError::Conflict("x".to_string()).is_recoverable());
    }
}
