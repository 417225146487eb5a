//! Event lifecycle service
//!
//! This service owns event creation, owner and admin updates, and the
//! lifecycle state machine: PENDING -> PUBLISHED | CANCELED, with the owner
//! able to resubmit a canceled event for review. Published events are
//! immutable on the owner path.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::database::repositories::{CategoryRepository, EventRepository, UserRepository};
use crate::models::event::{
    AdminEventFilter, AdminStateAction, Event, EventFullDto, EventPatch, EventShortDto,
    EventState, NewEvent, UpdateEventByAdmin, UpdateEventByOwner,
};
use crate::services::enrichment::EventStatsService;
use crate::utils::errors::{AfishaError, Result};
use crate::utils::paging::page_bounds;

/// Event lifecycle service
#[derive(Debug, Clone)]
pub struct EventService {
    event_repository: EventRepository,
    user_repository: UserRepository,
    category_repository: CategoryRepository,
    stats_service: EventStatsService,
    settings: Settings,
}

impl EventService {
    pub fn new(
        event_repository: EventRepository,
        user_repository: UserRepository,
        category_repository: CategoryRepository,
        stats_service: EventStatsService,
        settings: Settings,
    ) -> Self {
        Self {
            event_repository,
            user_repository,
            category_repository,
            stats_service,
            settings,
        }
    }

    /// Create a new event in the pending state
    pub async fn create_event(
        &self,
        initiator_id: i64,
        new_event: NewEvent,
    ) -> Result<EventFullDto> {
        debug!(initiator_id = initiator_id, "Creating event");

        let initiator = self
            .user_repository
            .find_by_id(initiator_id)
            .await?
            .ok_or(AfishaError::UserNotFound {
                user_id: initiator_id,
            })?;
        let category = self
            .category_repository
            .find_by_id(new_event.category)
            .await?
            .ok_or(AfishaError::CategoryNotFound {
                category_id: new_event.category,
            })?;

        validate_text_bounds(
            Some(new_event.title.as_str()),
            Some(new_event.annotation.as_str()),
            Some(new_event.description.as_str()),
        )?;
        validate_participant_limit(new_event.participant_limit)?;
        validate_event_date(
            new_event.event_date,
            self.settings.events.user_lead_hours,
            Utc::now(),
        )?;

        let event = self.event_repository.create(initiator_id, &new_event).await?;
        info!(
            event_id = event.id,
            initiator_id = initiator_id,
            "Event created"
        );

        Ok(EventFullDto::from_event(
            &event,
            (&category).into(),
            (&initiator).into(),
            0,
            0,
        ))
    }

    /// List events created by the given user
    pub async fn get_own_events(
        &self,
        user_id: i64,
        from: i64,
        size: i64,
    ) -> Result<Vec<EventShortDto>> {
        self.check_user_exists(user_id).await?;
        let (limit, offset) = page_bounds(from, size)?;

        let events = self
            .event_repository
            .find_by_initiator(user_id, limit, offset)
            .await?;
        self.stats_service.enrich_short_batch(&events).await
    }

    /// Fetch one event owned by the given user
    pub async fn get_own_event(&self, user_id: i64, event_id: i64) -> Result<EventFullDto> {
        self.check_user_exists(user_id).await?;
        let event = self
            .event_repository
            .find_by_id_and_initiator(event_id, user_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        self.stats_service.enrich_full(&event).await
    }

    /// Update an event on the owner path.
    ///
    /// Published events cannot be edited; a patched event date must still
    /// satisfy the user lead time.
    pub async fn update_event_by_owner(
        &self,
        user_id: i64,
        event_id: i64,
        update: UpdateEventByOwner,
    ) -> Result<EventFullDto> {
        self.check_user_exists(user_id).await?;
        let mut event = self
            .event_repository
            .find_by_id_and_initiator(event_id, user_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        if event.state == EventState::Published {
            warn!(event_id = event_id, "Rejected owner update of published event");
            return Err(AfishaError::Conflict(
                "Only pending or canceled events can be modified".to_string(),
            ));
        }

        self.validate_patch(&update.patch).await?;
        if let Some(event_date) = update.patch.event_date {
            validate_event_date(
                event_date,
                self.settings.events.user_lead_hours,
                Utc::now(),
            )?;
        }

        update.patch.apply_to(&mut event);
        if let Some(action) = update.state_action {
            event.state = action.target_state();
        }

        let saved = self.event_repository.update(&event).await?;
        info!(
            event_id = event_id,
            state = %saved.state,
            "Event updated by owner"
        );

        self.stats_service.enrich_full(&saved).await
    }

    /// Update an event on the admin path: publish, reject, or edit content.
    pub async fn update_event_by_admin(
        &self,
        event_id: i64,
        update: UpdateEventByAdmin,
    ) -> Result<EventFullDto> {
        let mut event = self
            .event_repository
            .find_by_id(event_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        if let Some(action) = update.state_action {
            apply_admin_action(
                &mut event,
                action,
                self.settings.events.publish_lead_hours,
                Utc::now(),
            )?;
        }

        self.validate_patch(&update.patch).await?;
        update.patch.apply_to(&mut event);

        let saved = self.event_repository.update(&event).await?;
        info!(
            event_id = event_id,
            state = %saved.state,
            "Event updated by admin"
        );

        self.stats_service.enrich_full(&saved).await
    }

    /// Admin search over events with optional filters
    pub async fn search_events_admin(
        &self,
        filter: AdminEventFilter,
        from: i64,
        size: i64,
    ) -> Result<Vec<EventFullDto>> {
        if let (Some(start), Some(end)) = (filter.range_start, filter.range_end) {
            if end < start {
                return Err(AfishaError::Validation(
                    "range_end must not be before range_start".to_string(),
                ));
            }
        }
        let (limit, offset) = page_bounds(from, size)?;

        let events = self.event_repository.search_admin(&filter, limit, offset).await?;
        debug!(found = events.len(), "Admin event search completed");

        self.stats_service.enrich_full_batch(&events).await
    }

    async fn check_user_exists(&self, user_id: i64) -> Result<()> {
        if !self.user_repository.exists(user_id).await? {
            return Err(AfishaError::UserNotFound { user_id });
        }
        Ok(())
    }

    async fn validate_patch(&self, patch: &EventPatch) -> Result<()> {
        validate_text_bounds(
            patch.title.as_deref(),
            patch.annotation.as_deref(),
            patch.description.as_deref(),
        )?;
        if let Some(limit) = patch.participant_limit {
            validate_participant_limit(limit)?;
        }
        if let Some(category_id) = patch.category {
            if !self.category_repository.exists(category_id).await? {
                return Err(AfishaError::CategoryNotFound { category_id });
            }
        }
        Ok(())
    }
}

/// Apply an admin state action, enforcing the publication guards.
fn apply_admin_action(
    event: &mut Event,
    action: AdminStateAction,
    publish_lead_hours: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        AdminStateAction::PublishEvent => {
            if event.state != EventState::Pending {
                return Err(AfishaError::Conflict(
                    "Only pending events can be published".to_string(),
                ));
            }
            if event.event_date < now + Duration::hours(publish_lead_hours) {
                return Err(AfishaError::Conflict(format!(
                    "Event date must be at least {publish_lead_hours} hour(s) after publication"
                )));
            }
            event.state = EventState::Published;
            event.published_at = Some(now);
        }
        AdminStateAction::RejectEvent => {
            if event.state == EventState::Published {
                return Err(AfishaError::Conflict(
                    "Published events cannot be rejected".to_string(),
                ));
            }
            event.state = EventState::Canceled;
        }
    }
    Ok(())
}

/// Check the lead-time rule for an event date
fn validate_event_date(
    event_date: DateTime<Utc>,
    lead_hours: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    if event_date < now + Duration::hours(lead_hours) {
        return Err(AfishaError::Validation(format!(
            "Event date must be at least {lead_hours} hour(s) in the future"
        )));
    }
    Ok(())
}

fn validate_text_bounds(
    title: Option<&str>,
    annotation: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    if let Some(title) = title {
        check_length("title", title, 3, 120)?;
    }
    if let Some(annotation) = annotation {
        check_length("annotation", annotation, 20, 2000)?;
    }
    if let Some(description) = description {
        check_length("description", description, 20, 7000)?;
    }
    Ok(())
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AfishaError::Validation(format!(
            "{field} length must be between {min} and {max} characters, got {len}"
        )));
    }
    Ok(())
}

fn validate_participant_limit(limit: i32) -> Result<()> {
    if limit < 0 {
        return Err(AfishaError::Validation(format!(
            "participant_limit must not be negative, got {limit}"
        )));
    }
    Ok(())
}
