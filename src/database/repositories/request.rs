//! Participation request repository implementation
//!
//! Alongside the pool-based queries this repository exposes `*_tx` variants
//! taking an open connection, so that admission control can compose the
//! count-then-write sequence inside one transaction.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};

use crate::models::request::{ParticipationRequest, RequestStatus};
use crate::utils::errors::AfishaError;

const REQUEST_COLUMNS: &str = "id, event_id, requester_id, created, status";

#[derive(Debug, Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a request owned by the given requester
    pub async fn find_by_id_and_requester(
        &self,
        request_id: i64,
        requester_id: i64,
    ) -> Result<Option<ParticipationRequest>, AfishaError> {
        let request = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM participation_requests \
             WHERE id = $1 AND requester_id = $2"
        ))
        .bind(request_id)
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// All requests created by the given user
    pub async fn find_by_requester(
        &self,
        requester_id: i64,
    ) -> Result<Vec<ParticipationRequest>, AfishaError> {
        let requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM participation_requests \
             WHERE requester_id = $1 ORDER BY created"
        ))
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// All requests targeting the given event
    pub async fn find_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<ParticipationRequest>, AfishaError> {
        let requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM participation_requests \
             WHERE event_id = $1 ORDER BY created"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Check for an existing non-canceled request for (event, requester)
    pub async fn exists_active(
        &self,
        event_id: i64,
        requester_id: i64,
    ) -> Result<bool, AfishaError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM participation_requests \
             WHERE event_id = $1 AND requester_id = $2 AND status <> $3)",
        )
        .bind(event_id)
        .bind(requester_id)
        .bind(RequestStatus::Canceled)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Count confirmed requests for one event
    pub async fn count_confirmed(&self, event_id: i64) -> Result<i64, AfishaError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participation_requests WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id)
        .bind(RequestStatus::Confirmed)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Confirmed-request counts for a batch of events, one query.
    ///
    /// Events without confirmed requests are simply absent from the map.
    pub async fn count_confirmed_batch(
        &self,
        event_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AfishaError> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT event_id, COUNT(*) FROM participation_requests \
             WHERE event_id = ANY($1) AND status = $2 GROUP BY event_id",
        )
        .bind(event_ids)
        .bind(RequestStatus::Confirmed)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Set the status of a single request
    pub async fn update_status(
        &self,
        request_id: i64,
        status: RequestStatus,
    ) -> Result<ParticipationRequest, AfishaError> {
        let request = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "UPDATE participation_requests SET status = $2 WHERE id = $1 \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    /// Transaction-scoped confirmed count; pairs with a `FOR UPDATE` lock on
    /// the event row taken by the caller
    pub async fn count_confirmed_tx(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<i64, AfishaError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participation_requests WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id)
        .bind(RequestStatus::Confirmed)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.0)
    }

    /// Transaction-scoped insert
    pub async fn insert_tx(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        requester_id: i64,
        status: RequestStatus,
    ) -> Result<ParticipationRequest, AfishaError> {
        let request = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "INSERT INTO participation_requests (event_id, requester_id, created, status) \
             VALUES ($1, $2, $3, $4) RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(event_id)
        .bind(requester_id)
        .bind(Utc::now())
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;

        Ok(request)
    }

    /// Transaction-scoped lookup of moderation targets, locking the rows
    pub async fn find_by_ids_and_event_tx(
        &self,
        conn: &mut PgConnection,
        request_ids: &[i64],
        event_id: i64,
    ) -> Result<Vec<ParticipationRequest>, AfishaError> {
        if request_ids.is_empty() {
            return Ok(Vec::new());
        }

        let requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM participation_requests \
             WHERE id = ANY($1) AND event_id = $2 ORDER BY id FOR UPDATE"
        ))
        .bind(request_ids)
        .bind(event_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(requests)
    }

    /// Transaction-scoped bulk status change
    pub async fn set_status_batch_tx(
        &self,
        conn: &mut PgConnection,
        request_ids: &[i64],
        status: RequestStatus,
    ) -> Result<Vec<ParticipationRequest>, AfishaError> {
        if request_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut requests = sqlx::query_as::<_, ParticipationRequest>(&format!(
            "UPDATE participation_requests SET status = $2 WHERE id = ANY($1) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_ids)
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;

        requests.sort_by_key(|r| r.id);
        Ok(requests)
    }
}
