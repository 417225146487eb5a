//! Event repository implementation
//!
//! Persistence for the event entity, including the filtered admin and
//! public searches. Filters are explicit structs translated into a single
//! parameterized query; present fields are AND-ed together.

use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::models::event::{AdminEventFilter, Event, EventState, NewEvent, PublicSearchFilter};
use crate::utils::errors::AfishaError;

const EVENT_COLUMNS: &str = "id, title, annotation, description, category_id, initiator_id, \
     created_at, event_date, published_at, lat, lon, paid, participant_limit, \
     request_moderation, state";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new event in the pending state
    pub async fn create(
        &self,
        initiator_id: i64,
        new_event: &NewEvent,
    ) -> Result<Event, AfishaError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, annotation, description, category_id, initiator_id,
                                created_at, event_date, lat, lon, paid, participant_limit,
                                request_moderation, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&new_event.title)
        .bind(&new_event.annotation)
        .bind(&new_event.description)
        .bind(new_event.category)
        .bind(initiator_id)
        .bind(Utc::now())
        .bind(new_event.event_date)
        .bind(new_event.location.lat)
        .bind(new_event.location.lon)
        .bind(new_event.paid)
        .bind(new_event.participant_limit)
        .bind(new_event.request_moderation)
        .bind(EventState::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, AfishaError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find an event owned by the given initiator
    pub async fn find_by_id_and_initiator(
        &self,
        id: i64,
        initiator_id: i64,
    ) -> Result<Option<Event>, AfishaError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND initiator_id = $2"
        ))
        .bind(id)
        .bind(initiator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find a published event; non-published events are invisible publicly
    pub async fn find_published(&self, id: i64) -> Result<Option<Event>, AfishaError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND state = $2"
        ))
        .bind(id)
        .bind(EventState::Published)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Lock and re-read an event row inside a transaction.
    ///
    /// Used by admission control so that the confirmed-count read and the
    /// subsequent status write see a consistent snapshot.
    pub async fn find_by_id_for_update(
        &self,
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Event>, AfishaError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(event)
    }

    /// List events created by the given user, newest first
    pub async fn find_by_initiator(
        &self,
        initiator_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, AfishaError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE initiator_id = $1 \
             ORDER BY id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(initiator_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Persist the mutable fields of an event
    pub async fn update(&self, event: &Event) -> Result<Event, AfishaError> {
        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                annotation = $3,
                description = $4,
                category_id = $5,
                event_date = $6,
                published_at = $7,
                lat = $8,
                lon = $9,
                paid = $10,
                participant_limit = $11,
                request_moderation = $12,
                state = $13
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.annotation)
        .bind(&event.description)
        .bind(event.category_id)
        .bind(event.event_date)
        .bind(event.published_at)
        .bind(event.lat)
        .bind(event.lon)
        .bind(event.paid)
        .bind(event.participant_limit)
        .bind(event.request_moderation)
        .bind(event.state)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Admin search: filter by initiators, states, categories and date range.
    ///
    /// When both date bounds are absent, only future events are returned.
    pub async fn search_admin(
        &self,
        filter: &AdminEventFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, AfishaError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"
        ));

        if let Some(users) = &filter.users {
            if !users.is_empty() {
                qb.push(" AND initiator_id = ANY(");
                qb.push_bind(users.clone());
                qb.push(")");
            }
        }

        if let Some(states) = &filter.states {
            if !states.is_empty() {
                let names: Vec<String> = states.iter().map(ToString::to_string).collect();
                qb.push(" AND state = ANY(");
                qb.push_bind(names);
                qb.push("::event_state[])");
            }
        }

        if let Some(categories) = &filter.categories {
            if !categories.is_empty() {
                qb.push(" AND category_id = ANY(");
                qb.push_bind(categories.clone());
                qb.push(")");
            }
        }

        match (filter.range_start, filter.range_end) {
            (None, None) => {
                qb.push(" AND event_date > ");
                qb.push_bind(Utc::now());
            }
            (start, end) => {
                if let Some(start) = start {
                    qb.push(" AND event_date >= ");
                    qb.push_bind(start);
                }
                if let Some(end) = end {
                    qb.push(" AND event_date <= ");
                    qb.push_bind(end);
                }
            }
        }

        qb.push(" ORDER BY id LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let events = qb.build_query_as::<Event>().fetch_all(&self.pool).await?;

        Ok(events)
    }

    /// Public search: published events matching the optional filters.
    ///
    /// Results are ordered by event date; a views-based ordering is applied
    /// by the caller after enrichment.
    pub async fn search_public(
        &self,
        filter: &PublicSearchFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, AfishaError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE state = "
        ));
        qb.push_bind(EventState::Published);

        if let Some(text) = &filter.text {
            if !text.trim().is_empty() {
                let pattern = format!("%{}%", text);
                qb.push(" AND (annotation ILIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" OR description ILIKE ");
                qb.push_bind(pattern);
                qb.push(")");
            }
        }

        if let Some(categories) = &filter.categories {
            if !categories.is_empty() {
                qb.push(" AND category_id = ANY(");
                qb.push_bind(categories.clone());
                qb.push(")");
            }
        }

        if let Some(paid) = filter.paid {
            qb.push(" AND paid = ");
            qb.push_bind(paid);
        }

        match (filter.range_start, filter.range_end) {
            (None, None) => {
                qb.push(" AND event_date >= ");
                qb.push_bind(Utc::now());
            }
            (start, end) => {
                if let Some(start) = start {
                    qb.push(" AND event_date >= ");
                    qb.push_bind(start);
                }
                if let Some(end) = end {
                    qb.push(" AND event_date <= ");
                    qb.push_bind(end);
                }
            }
        }

        if filter.only_available {
            qb.push(
                " AND (participant_limit = 0 OR participant_limit > \
                 (SELECT COUNT(*) FROM participation_requests pr \
                  WHERE pr.event_id = events.id AND pr.status = 'CONFIRMED'))",
            );
        }

        qb.push(" ORDER BY event_date LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let events = qb.build_query_as::<Event>().fetch_all(&self.pool).await?;

        Ok(events)
    }
}
