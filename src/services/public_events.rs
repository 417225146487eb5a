//! Public event queries
//!
//! Search and single-event reads over published events. Every public read
//! records a hit against the stats collector with the caller's IP.

use tracing::debug;

use crate::database::repositories::EventRepository;
use crate::models::event::{EventFullDto, EventShortDto, EventSort, PublicSearchFilter};
use crate::services::enrichment::EventStatsService;
use crate::services::stats::{event_uri, EVENTS_ENDPOINT};
use crate::utils::errors::{AfishaError, Result};
use crate::utils::paging::page_bounds;

/// Public event query service
#[derive(Debug, Clone)]
pub struct PublicEventService {
    event_repository: EventRepository,
    stats_service: EventStatsService,
}

impl PublicEventService {
    pub fn new(event_repository: EventRepository, stats_service: EventStatsService) -> Self {
        Self {
            event_repository,
            stats_service,
        }
    }

    /// Search published events.
    ///
    /// When neither date bound is given, only upcoming events are returned.
    /// The views ordering is applied after enrichment, since view counts
    /// live outside the database.
    pub async fn search(
        &self,
        filter: PublicSearchFilter,
        sort: EventSort,
        from: i64,
        size: i64,
        ip: &str,
    ) -> Result<Vec<EventShortDto>> {
        if let (Some(start), Some(end)) = (filter.range_start, filter.range_end) {
            if end < start {
                return Err(AfishaError::Validation(
                    "range_end must not be before range_start".to_string(),
                ));
            }
        }
        let (limit, offset) = page_bounds(from, size)?;

        let events = self.event_repository.search_public(&filter, limit, offset).await?;
        debug!(found = events.len(), "Public event search completed");

        self.stats_service.record_hit(EVENTS_ENDPOINT, ip).await;

        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut dtos = self.stats_service.enrich_short_batch(&events).await?;
        if sort == EventSort::Views {
            sort_by_views(&mut dtos);
        }

        Ok(dtos)
    }

    /// Fetch one published event by id and record the page view
    pub async fn get_published_event(&self, event_id: i64, ip: &str) -> Result<EventFullDto> {
        let event = self
            .event_repository
            .find_published(event_id)
            .await?
            .ok_or(AfishaError::EventNotFound { event_id })?;

        let dto = self.stats_service.enrich_full(&event).await?;
        self.stats_service.record_hit(&event_uri(event_id), ip).await;

        Ok(dto)
    }
}

/// Order by view count descending, breaking ties by the soonest event date.
fn sort_by_views(dtos: &mut [EventShortDto]) {
    dtos.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then_with(|| a.event_date.cmp(&b.event_date))
    });
}
