//! Participation admission service
//!
//! Owns the participation-request workflow: creation with auto-confirm or
//! moderation, cancellation by the requester, and bulk confirm/reject by the
//! event initiator. Capacity enforcement runs inside a database transaction
//! holding a row lock on the event, so concurrent admissions for the same
//! event cannot jointly exceed the participant limit.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::repositories::{EventRepository, RequestRepository, UserRepository};
use crate::models::event::EventState;
use crate::models::request::{
    ModerationStatus, ParticipationRequestDto, RequestStatus, StatusUpdate, StatusUpdateResult,
};
use crate::utils::errors::{AfishaError, Result};

/// Participation request service
#[derive(Debug, Clone)]
pub struct RequestService {
    pool: PgPool,
    request_repository: RequestRepository,
    event_repository: EventRepository,
    user_repository: UserRepository,
}

impl RequestService {
    pub fn new(
        pool: PgPool,
        request_repository: RequestRepository,
        event_repository: EventRepository,
        user_repository: UserRepository,
    ) -> Self {
        Self {
            pool,
            request_repository,
            event_repository,
            user_repository,
        }
    }

    /// Create a participation request for a published event.
    ///
    /// The request auto-confirms when the event needs no moderation or has
    /// no participant limit; otherwise it is created pending.
    pub async fn create_request(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<ParticipationRequestDto> {
        debug!(user_id = user_id, event_id = event_id, "Creating participation request");

        if !self.user_repository.exists(user_id).await? {
            return Err(AfishaError::UserNotFound { user_id });
        }
        let event = self
            .event_repository
            .find_by_id(event_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        if event.initiator_id == user_id {
            return Err(AfishaError::Conflict(
                "Initiator cannot request participation in own event".to_string(),
            ));
        }
        if event.state != EventState::Published {
            return Err(AfishaError::Conflict(
                "Cannot participate in an unpublished event".to_string(),
            ));
        }
        if self.request_repository.exists_active(event_id, user_id).await? {
            return Err(AfishaError::Conflict(
                "A participation request for this event already exists".to_string(),
            ));
        }

        // Capacity check, status decision and insert share one snapshot.
        let mut tx = self.pool.begin().await?;
        let event = self
            .event_repository
            .find_by_id_for_update(&mut tx, event_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        if event.participant_limit > 0 {
            let confirmed = self
                .request_repository
                .count_confirmed_tx(&mut tx, event_id)
                .await?;
            if confirmed >= i64::from(event.participant_limit) {
                return Err(AfishaError::Conflict(
                    "The participant limit has been reached".to_string(),
                ));
            }
        }

        let status = initial_status(event.request_moderation, event.participant_limit);
        let request = self
            .request_repository
            .insert_tx(&mut tx, event_id, user_id, status)
            .await?;
        tx.commit().await?;

        info!(
            request_id = request.id,
            event_id = event_id,
            requester_id = user_id,
            status = %request.status,
            "Participation request created"
        );

        Ok(ParticipationRequestDto::from(&request))
    }

    /// Cancel the requester's own request.
    ///
    /// Always records CANCELED: re-canceling, or canceling a confirmed or
    /// rejected request, is not an error.
    pub async fn cancel_request(
        &self,
        user_id: i64,
        request_id: i64,
    ) -> Result<ParticipationRequestDto> {
        let request = self
            .request_repository
            .find_by_id_and_requester(request_id, user_id)
            .await?
            .ok_or(AfishaError::RequestNotFound { request_id })?;

        let updated = self
            .request_repository
            .update_status(request.id, RequestStatus::Canceled)
            .await?;

        info!(
            request_id = request_id,
            requester_id = user_id,
            "Participation request canceled"
        );

        Ok(ParticipationRequestDto::from(&updated))
    }

    /// All requests created by the given user
    pub async fn get_user_requests(&self, user_id: i64) -> Result<Vec<ParticipationRequestDto>> {
        if !self.user_repository.exists(user_id).await? {
            return Err(AfishaError::UserNotFound { user_id });
        }

        let requests = self.request_repository.find_by_requester(user_id).await?;
        Ok(requests.iter().map(ParticipationRequestDto::from).collect())
    }

    /// All requests targeting an event, visible to its initiator only
    pub async fn get_event_requests(
        &self,
        owner_id: i64,
        event_id: i64,
    ) -> Result<Vec<ParticipationRequestDto>> {
        self.check_event_ownership(owner_id, event_id).await?;

        let requests = self.request_repository.find_by_event(event_id).await?;
        Ok(requests.iter().map(ParticipationRequestDto::from).collect())
    }

    /// Bulk confirm or reject pending requests for a moderated event.
    ///
    /// The operation is all-or-nothing: every target must resolve to a
    /// pending request of this event, and a confirmation that would exceed
    /// the participant limit aborts the whole batch.
    pub async fn change_request_status(
        &self,
        owner_id: i64,
        event_id: i64,
        update: StatusUpdate,
    ) -> Result<StatusUpdateResult> {
        let event = self.check_event_ownership(owner_id, event_id).await?;

        if !event.request_moderation || event.participant_limit == 0 {
            return Err(AfishaError::Conflict(
                "Event does not require request moderation".to_string(),
            ));
        }
        if update.request_ids.is_empty() {
            return Ok(StatusUpdateResult::default());
        }

        let mut tx = self.pool.begin().await?;
        let event = self
            .event_repository
            .find_by_id_for_update(&mut tx, event_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        let targets = self
            .request_repository
            .find_by_ids_and_event_tx(&mut tx, &update.request_ids, event_id)
            .await?;

        let found: std::collections::HashSet<i64> = targets.iter().map(|r| r.id).collect();
        if let Some(missing) = update.request_ids.iter().find(|id| !found.contains(id)) {
            return Err(AfishaError::RequestNotFound {
                request_id: *missing,
            });
        }

        // Every target must still be pending before anything is mutated.
        if let Some(request) = targets.iter().find(|r| r.status != RequestStatus::Pending) {
            return Err(AfishaError::Conflict(format!(
                "Request {} is not pending (status: {})",
                request.id, request.status
            )));
        }

        if update.status == ModerationStatus::Confirmed {
            let confirmed = self
                .request_repository
                .count_confirmed_tx(&mut tx, event_id)
                .await?;
            let free_slots = i64::from(event.participant_limit) - confirmed;
            if (targets.len() as i64) > free_slots {
                return Err(AfishaError::Conflict(
                    "The participant limit has been reached".to_string(),
                ));
            }
        }

        let target_ids: Vec<i64> = targets.iter().map(|r| r.id).collect();
        let updated = self
            .request_repository
            .set_status_batch_tx(&mut tx, &target_ids, update.status.as_request_status())
            .await?;
        tx.commit().await?;

        info!(
            event_id = event_id,
            count = updated.len(),
            status = %update.status.as_request_status(),
            "Participation requests moderated"
        );

        let mut result = StatusUpdateResult::default();
        for request in &updated {
            let dto = ParticipationRequestDto::from(request);
            match request.status {
                RequestStatus::Confirmed => result.confirmed_requests.push(dto),
                RequestStatus::Rejected => result.rejected_requests.push(dto),
                _ => {}
            }
        }
        Ok(result)
    }

    async fn check_event_ownership(
        &self,
        owner_id: i64,
        event_id: i64,
    ) -> Result<crate::models::event::Event> {
        let event = self
            .event_repository
            .find_by_id(event_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        if event.initiator_id != owner_id {
            return Err(AfishaError::Conflict(
                "Only the event initiator can manage its requests".to_string(),
            ));
        }
        Ok(event)
    }
}

/// Initial status of a new request.
///
/// Auto-confirmed when moderation is off or capacity is unlimited; a limit
/// of zero overrides the moderation flag.
pub(crate) fn initial_status(request_moderation: bool, participant_limit: i32) -> RequestStatus {
    if !request_moderation || participant_limit == 0 {
        RequestStatus::Confirmed
    } else {
        RequestStatus::Pending
    }
}
