//! Services module
//!
//! This module contains business logic services

pub mod admission;
pub mod enrichment;
pub mod event;
pub mod public_events;
pub mod stats;

// Re-export commonly used services
pub use admission::RequestService;
pub use enrichment::EventStatsService;
pub use event::EventService;
pub use public_events::PublicEventService;
pub use stats::{EndpointHit, StatsClient, ViewStats};

use sqlx::PgPool;

use crate::config::settings::Settings;
use crate::database::repositories::{
    CategoryRepository, EventRepository, RequestRepository, UserRepository,
};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub request_service: RequestService,
    pub public_event_service: PublicEventService,
    pub stats_service: EventStatsService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(pool: PgPool, settings: Settings) -> Result<Self> {
        let user_repository = UserRepository::new(pool.clone());
        let category_repository = CategoryRepository::new(pool.clone());
        let event_repository = EventRepository::new(pool.clone());
        let request_repository = RequestRepository::new(pool.clone());

        let stats_client = StatsClient::new(&settings.stats)?;
        let stats_service = EventStatsService::new(
            stats_client,
            request_repository.clone(),
            user_repository.clone(),
            category_repository.clone(),
        );

        let event_service = EventService::new(
            event_repository.clone(),
            user_repository.clone(),
            category_repository,
            stats_service.clone(),
            settings,
        );
        let request_service = RequestService::new(
            pool,
            request_repository,
            event_repository.clone(),
            user_repository,
        );
        let public_event_service =
            PublicEventService::new(event_repository, stats_service.clone());

        Ok(Self {
            event_service,
            request_service,
            public_event_service,
            stats_service,
        })
    }
}
