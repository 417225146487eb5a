//! Test data builders

use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::Name;
use fake::Fake;

use afisha::config::settings::{Settings, StatsConfig};
use afisha::models::event::{Event, EventState, Location, NewEvent};
use afisha::services::ViewStats;

/// Settings pointing the stats client at the given mock collector
pub fn stats_settings(base_url: &str, timeout_ms: u64) -> Settings {
    let mut settings = Settings::default();
    settings.stats = StatsConfig {
        base_url: base_url.to_string(),
        app_name: "afisha-main".to_string(),
        timeout_ms,
    };
    settings
}

/// A well-formed creation payload with the given policy knobs
pub fn new_event_payload(
    category: i64,
    hours_ahead: i64,
    participant_limit: i32,
    request_moderation: bool,
) -> NewEvent {
    NewEvent {
        title: Sentence(3..6).fake(),
        annotation: format!("{} {}", Sentence(6..9).fake::<String>(), Sentence(6..9).fake::<String>()),
        description: Paragraph(3..5).fake(),
        category,
        event_date: Utc::now() + Duration::hours(hours_ahead),
        location: Location {
            lat: 55.75,
            lon: 37.61,
        },
        paid: false,
        participant_limit,
        request_moderation,
    }
}

/// A random display name
pub fn person_name() -> String {
    Name().fake()
}

/// An in-memory event row for tests that never touch the database
pub fn sample_event(id: i64, created_at: DateTime<Utc>) -> Event {
    Event {
        id,
        title: format!("Event {id}"),
        annotation: "A long enough annotation for the field bounds".to_string(),
        description: "A long enough description for the field bounds".to_string(),
        category_id: 1,
        initiator_id: 1,
        created_at,
        event_date: created_at + Duration::days(30),
        published_at: Some(created_at + Duration::days(1)),
        lat: 55.75,
        lon: 37.61,
        paid: false,
        participant_limit: 0,
        request_moderation: true,
        state: EventState::Published,
    }
}

/// A stats row for the given event id
pub fn view_stat(event_id: i64, hits: i64) -> ViewStats {
    ViewStats {
        app: "afisha-main".to_string(),
        uri: format!("/events/{event_id}"),
        hits,
    }
}

/// A fixed timestamp to anchor deterministic assertions
pub fn anchor_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
}
