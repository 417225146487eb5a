//! Event model and DTOs
//!
//! The event entity, its lifecycle state machine types, partial-update
//! payloads and the enriched response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::category::CategoryDto;
use crate::models::user::UserShortDto;

/// Lifecycle state of an event.
///
/// Stored as the Postgres enum `event_state`; the string form never leaks
/// into business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_state", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Pending,
    Published,
    Canceled,
}

impl std::fmt::Display for EventState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventState::Pending => write!(f, "PENDING"),
            EventState::Published => write!(f, "PUBLISHED"),
            EventState::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// State transitions available to the event owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStateAction {
    SendToReview,
    CancelReview,
}

impl UserStateAction {
    pub fn target_state(self) -> EventState {
        match self {
            UserStateAction::SendToReview => EventState::Pending,
            UserStateAction::CancelReview => EventState::Canceled,
        }
    }
}

/// State transitions available to the administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminStateAction {
    PublishEvent,
    RejectEvent,
}

/// Geographic location of the event venue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category_id: i64,
    pub initiator_id: i64,
    pub created_at: DateTime<Utc>,
    pub event_date: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub lat: f64,
    pub lon: f64,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub state: EventState,
}

impl Event {
    pub fn location(&self) -> Location {
        Location {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Payload for creating a new event
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category: i64,
    pub event_date: DateTime<Utc>,
    pub location: Location,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub participant_limit: i32,
    #[serde(default = "default_request_moderation")]
    pub request_moderation: bool,
}

fn default_request_moderation() -> bool {
    true
}

/// Content fields of a partial event update.
///
/// `None` uniformly means "leave the stored value unchanged"; there are no
/// zero-value sentinels, so any legitimate value (including category id 0)
/// can be set explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub annotation: Option<String>,
    pub description: Option<String>,
    pub category: Option<i64>,
    pub event_date: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
}

impl EventPatch {
    /// Apply the present fields to an event; absent fields are untouched.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(annotation) = &self.annotation {
            event.annotation = annotation.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(category) = self.category {
            event.category_id = category;
        }
        if let Some(event_date) = self.event_date {
            event.event_date = event_date;
        }
        if let Some(location) = self.location {
            event.lat = location.lat;
            event.lon = location.lon;
        }
        if let Some(paid) = self.paid {
            event.paid = paid;
        }
        if let Some(limit) = self.participant_limit {
            event.participant_limit = limit;
        }
        if let Some(moderation) = self.request_moderation {
            event.request_moderation = moderation;
        }
    }
}

/// Partial update issued by the event owner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventByOwner {
    #[serde(flatten)]
    pub patch: EventPatch,
    pub state_action: Option<UserStateAction>,
}

/// Partial update issued by an administrator
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventByAdmin {
    #[serde(flatten)]
    pub patch: EventPatch,
    pub state_action: Option<AdminStateAction>,
}

/// Admin search filter; present fields are AND-ed together
#[derive(Debug, Clone, Default)]
pub struct AdminEventFilter {
    pub users: Option<Vec<i64>>,
    pub states: Option<Vec<EventState>>,
    pub categories: Option<Vec<i64>>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
}

/// Public search filter; the published-only condition is always applied
#[derive(Debug, Clone, Default)]
pub struct PublicSearchFilter {
    /// Case-insensitive substring match over annotation and description
    pub text: Option<String>,
    pub categories: Option<Vec<i64>>,
    pub paid: Option<bool>,
    pub range_start: Option<DateTime<Utc>>,
    pub range_end: Option<DateTime<Utc>>,
    /// Keep only events that still have free participant slots
    pub only_available: bool,
}

/// Sort order for public event search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSort {
    EventDate,
    Views,
}

impl EventSort {
    /// Parse the sort query parameter; anything but `VIEWS` falls back to
    /// the event-date ordering.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(value) if value.eq_ignore_ascii_case("VIEWS") => EventSort::Views,
            _ => EventSort::EventDate,
        }
    }
}

/// Full event representation returned by owner/admin endpoints
#[derive(Debug, Clone, Serialize)]
pub struct EventFullDto {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category: CategoryDto,
    pub initiator: UserShortDto,
    pub created_at: DateTime<Utc>,
    pub event_date: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub location: Location,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub state: EventState,
    pub confirmed_requests: i64,
    pub views: i64,
}

impl EventFullDto {
    pub fn from_event(
        event: &Event,
        category: CategoryDto,
        initiator: UserShortDto,
        confirmed_requests: i64,
        views: i64,
    ) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            annotation: event.annotation.clone(),
            description: event.description.clone(),
            category,
            initiator,
            created_at: event.created_at,
            event_date: event.event_date,
            published_at: event.published_at,
            location: event.location(),
            paid: event.paid,
            participant_limit: event.participant_limit,
            request_moderation: event.request_moderation,
            state: event.state,
            confirmed_requests,
            views,
        }
    }
}

/// Compact event representation used in listings
#[derive(Debug, Clone, Serialize)]
pub struct EventShortDto {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub category: CategoryDto,
    pub initiator: UserShortDto,
    pub event_date: DateTime<Utc>,
    pub paid: bool,
    pub confirmed_requests: i64,
    pub views: i64,
}

impl EventShortDto {
    pub fn from_event(
        event: &Event,
        category: CategoryDto,
        initiator: UserShortDto,
        confirmed_requests: i64,
        views: i64,
    ) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            annotation: event.annotation.clone(),
            category,
            initiator,
            event_date: event.event_date,
            paid: event.paid,
            confirmed_requests,
            views,
        }
    }
}
