//! Participation request model and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a participation request.
///
/// Stored as the Postgres enum `request_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Rejected,
    Canceled,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "PENDING"),
            RequestStatus::Confirmed => write!(f, "CONFIRMED"),
            RequestStatus::Rejected => write!(f, "REJECTED"),
            RequestStatus::Canceled => write!(f, "CANCELED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ParticipationRequest {
    pub id: i64,
    pub event_id: i64,
    pub requester_id: i64,
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
}

/// Target status for bulk moderation.
///
/// Only confirm and reject are representable; any other wire value fails to
/// deserialize before reaching the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    Confirmed,
    Rejected,
}

impl ModerationStatus {
    pub fn as_request_status(self) -> RequestStatus {
        match self {
            ModerationStatus::Confirmed => RequestStatus::Confirmed,
            ModerationStatus::Rejected => RequestStatus::Rejected,
        }
    }
}

/// Bulk status-change payload for the event owner
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub request_ids: Vec<i64>,
    pub status: ModerationStatus,
}

/// Result of a bulk status change, partitioned by outcome
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusUpdateResult {
    pub confirmed_requests: Vec<ParticipationRequestDto>,
    pub rejected_requests: Vec<ParticipationRequestDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationRequestDto {
    pub id: i64,
    pub event: i64,
    pub requester: i64,
    pub created: DateTime<Utc>,
    pub status: RequestStatus,
}

impl From<&ParticipationRequest> for ParticipationRequestDto {
    fn from(request: &ParticipationRequest) -> Self {
        Self {
            id: request.id,
            event: request.event_id,
            requester: request.requester_id,
            created: request.created,
            status: request.status,
        }
    }
}
