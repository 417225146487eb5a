//! Event enrichment service
//!
//! Attaches the derived `confirmed_requests` and `views` fields to event
//! DTOs. Listings go through the batch paths: one grouped confirmed-count
//! query and one stats call for the whole page, joined in memory. A stats
//! collector failure degrades to zero views and never fails the read.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, warn};

use crate::database::repositories::{CategoryRepository, RequestRepository, UserRepository};
use crate::models::category::CategoryDto;
use crate::models::event::{Event, EventFullDto, EventShortDto};
use crate::models::user::UserShortDto;
use crate::services::stats::{event_uri, parse_event_uri, StatsClient, ViewStats};
use crate::utils::errors::{AfishaError, Result};

/// Enrichment service composing events with request counts and view counts
#[derive(Debug, Clone)]
pub struct EventStatsService {
    stats_client: StatsClient,
    request_repository: RequestRepository,
    user_repository: UserRepository,
    category_repository: CategoryRepository,
}

impl EventStatsService {
    pub fn new(
        stats_client: StatsClient,
        request_repository: RequestRepository,
        user_repository: UserRepository,
        category_repository: CategoryRepository,
    ) -> Self {
        Self {
            stats_client,
            request_repository,
            user_repository,
            category_repository,
        }
    }

    /// Enrich a single event into its full DTO
    pub async fn enrich_full(&self, event: &Event) -> Result<EventFullDto> {
        let mut dtos = self.enrich_full_batch(std::slice::from_ref(event)).await?;
        dtos.pop().ok_or(AfishaError::EventNotFound {
            event_id: event.id,
        })
    }

    /// Enrich a batch of events into full DTOs without N+1 lookups
    pub async fn enrich_full_batch(&self, events: &[Event]) -> Result<Vec<EventFullDto>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let parts = self.load_enrichment(events).await?;

        events
            .iter()
            .map(|event| {
                let (category, initiator) = parts.refs_for(event)?;
                Ok(EventFullDto::from_event(
                    event,
                    category,
                    initiator,
                    parts.confirmed(event.id),
                    parts.views(event.id),
                ))
            })
            .collect()
    }

    /// Enrich a batch of events into short DTOs without N+1 lookups
    pub async fn enrich_short_batch(&self, events: &[Event]) -> Result<Vec<EventShortDto>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let parts = self.load_enrichment(events).await?;

        events
            .iter()
            .map(|event| {
                let (category, initiator) = parts.refs_for(event)?;
                Ok(EventShortDto::from_event(
                    event,
                    category,
                    initiator,
                    parts.confirmed(event.id),
                    parts.views(event.id),
                ))
            })
            .collect()
    }

    /// Confirmed-request counts for a set of events; absent means zero
    pub async fn confirmed_counts(&self, event_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        let mut counts: HashMap<i64, i64> = event_ids.iter().map(|id| (*id, 0)).collect();
        for (event_id, count) in self.request_repository.count_confirmed_batch(event_ids).await? {
            counts.insert(event_id, count);
        }
        Ok(counts)
    }

    /// View counts for the given events.
    ///
    /// One stats call for the whole batch, counting unique IPs since the
    /// oldest event was created. On any stats failure every event reports
    /// zero views; the failure is logged and swallowed.
    pub async fn views_for_events(&self, events: &[Event]) -> HashMap<i64, i64> {
        let mut views: HashMap<i64, i64> = events.iter().map(|e| (e.id, 0)).collect();
        if events.is_empty() {
            return views;
        }

        let uris: Vec<String> = events.iter().map(|e| event_uri(e.id)).collect();
        let start = events
            .iter()
            .map(|e| e.created_at)
            .min()
            .unwrap_or_else(Utc::now);

        match self
            .stats_client
            .get_stats(start, Utc::now(), &uris, true)
            .await
        {
            Ok(stats) => {
                apply_view_stats(&mut views, &stats);
                debug!(events = events.len(), "View counts loaded");
            }
            Err(e) => {
                warn!(error = %e, "Stats collector unavailable, reporting zero views");
            }
        }

        views
    }

    /// Record a page view; failures are logged and never propagate
    pub async fn record_hit(&self, uri: &str, ip: &str) {
        if let Err(e) = self.stats_client.hit(uri, ip).await {
            warn!(uri = uri, error = %e, "Failed to record hit");
        }
    }

    async fn load_enrichment(&self, events: &[Event]) -> Result<EnrichmentParts> {
        let event_ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let mut category_ids: Vec<i64> = events.iter().map(|e| e.category_id).collect();
        let mut initiator_ids: Vec<i64> = events.iter().map(|e| e.initiator_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        initiator_ids.sort_unstable();
        initiator_ids.dedup();

        let (confirmed, views) = futures::future::join(
            self.confirmed_counts(&event_ids),
            self.views_for_events(events),
        )
        .await;

        let categories = self
            .category_repository
            .find_by_ids(&category_ids)
            .await?
            .iter()
            .map(|c| (c.id, CategoryDto::from(c)))
            .collect();
        let initiators = self
            .user_repository
            .find_by_ids(&initiator_ids)
            .await?
            .iter()
            .map(|u| (u.id, UserShortDto::from(u)))
            .collect();

        Ok(EnrichmentParts {
            confirmed: confirmed?,
            views,
            categories,
            initiators,
        })
    }
}

struct EnrichmentParts {
    confirmed: HashMap<i64, i64>,
    views: HashMap<i64, i64>,
    categories: HashMap<i64, CategoryDto>,
    initiators: HashMap<i64, UserShortDto>,
}

impl EnrichmentParts {
    fn confirmed(&self, event_id: i64) -> i64 {
        self.confirmed.get(&event_id).copied().unwrap_or(0)
    }

    fn views(&self, event_id: i64) -> i64 {
        self.views.get(&event_id).copied().unwrap_or(0)
    }

    fn refs_for(&self, event: &Event) -> Result<(CategoryDto, UserShortDto)> {
        let category = self
            .categories
            .get(&event.category_id)
            .cloned()
            .ok_or(AfishaError::CategoryNotFound {
                category_id: event.category_id,
            })?;
        let initiator = self
            .initiators
            .get(&event.initiator_id)
            .cloned()
            .ok_or(AfishaError::UserNotFound {
                user_id: event.initiator_id,
            })?;
        Ok((category, initiator))
    }
}

/// Merge view stats into a prefilled zero map, keyed back to event ids.
///
/// Stats for URIs that do not parse back to a known event are ignored.
fn apply_view_stats(views: &mut HashMap<i64, i64>, stats: &[ViewStats]) {
    for stat in stats {
        if let Some(event_id) = parse_event_uri(&stat.uri) {
            if let Some(slot) = views.get_mut(&event_id) {
                *slot = stat.hits;
            }
        }
    }
}
