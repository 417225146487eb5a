//! Admission and lifecycle integration tests
//!
//! End-to-end flows over a disposable Postgres instance and a mock stats
//! collector. These tests need a local Docker daemon; run them with
//! `cargo test -- --ignored`.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use afisha::models::event::{
    AdminStateAction, EventSort, PublicSearchFilter, UpdateEventByAdmin, UpdateEventByOwner,
};
use afisha::models::request::{ModerationStatus, RequestStatus, StatusUpdate};
use afisha::services::ServiceFactory;
use afisha::utils::errors::AfishaError;

use helpers::*;

async fn build_factory(db: &TestDatabase, stats: &StatsMockServer) -> ServiceFactory {
    stats.mock_hit_ok().await;
    stats.mock_stats(vec![]).await;
    ServiceFactory::new(db.pool.clone(), stats_settings(&stats.base_url(), 500))
        .expect("failed to build services")
}

fn publish() -> UpdateEventByAdmin {
    UpdateEventByAdmin {
        state_action: Some(AdminStateAction::PublishEvent),
        ..Default::default()
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_moderated_event_capacity_flow() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let alice = db.insert_user("Alice").await;
    let bob = db.insert_user("Bob").await;
    let category = db.insert_category("Dance").await;

    // participant_limit = 1, moderation on, event in 3 hours
    let event = services
        .event_service
        .create_event(owner, new_event_payload(category, 3, 1, true))
        .await
        .expect("event creation should succeed");
    assert!(event.published_at.is_none());

    // 3h lead satisfies the 1h publish buffer
    let published = services
        .event_service
        .update_event_by_admin(event.id, publish())
        .await
        .expect("publication should succeed");
    assert!(published.published_at.is_some());

    // moderation on: Alice's request stays pending
    let alice_request = services
        .request_service
        .create_request(alice, event.id)
        .await
        .expect("request should be accepted");
    assert_eq!(alice_request.status, RequestStatus::Pending);

    let result = services
        .request_service
        .change_request_status(
            owner,
            event.id,
            StatusUpdate {
                request_ids: vec![alice_request.id],
                status: ModerationStatus::Confirmed,
            },
        )
        .await
        .expect("confirmation should succeed");
    assert_eq!(result.confirmed_requests.len(), 1);
    assert!(result.rejected_requests.is_empty());

    let enriched = services
        .event_service
        .get_own_event(owner, event.id)
        .await
        .expect("owner read should succeed");
    assert_eq!(enriched.confirmed_requests, 1);

    // The limit check compares confirmed-count, so Bob is turned away even
    // though his request would only have been pending.
    let denied = services.request_service.create_request(bob, event.id).await;
    assert_matches!(denied, Err(AfishaError::Conflict(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_create_request_guards() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let guest = db.insert_user("Guest").await;
    let category = db.insert_category("Concerts").await;

    let event = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 10, true))
        .await
        .unwrap();

    // not published yet
    assert_matches!(
        services.request_service.create_request(guest, event.id).await,
        Err(AfishaError::Conflict(_))
    );

    services
        .event_service
        .update_event_by_admin(event.id, publish())
        .await
        .unwrap();

    // own event, regardless of state
    assert_matches!(
        services.request_service.create_request(owner, event.id).await,
        Err(AfishaError::Conflict(_))
    );

    // absent collaborators
    assert_matches!(
        services.request_service.create_request(9999, event.id).await,
        Err(AfishaError::UserNotFound { .. })
    );
    assert_matches!(
        services.request_service.create_request(guest, 9999).await,
        Err(AfishaError::EventNotFound { .. })
    );

    let first = services
        .request_service
        .create_request(guest, event.id)
        .await
        .unwrap();

    // duplicate while the first is alive
    assert_matches!(
        services.request_service.create_request(guest, event.id).await,
        Err(AfishaError::Conflict(_))
    );

    // canceling frees the slot for a new request
    let canceled = services
        .request_service
        .cancel_request(guest, first.id)
        .await
        .unwrap();
    assert_eq!(canceled.status, RequestStatus::Canceled);

    let second = services
        .request_service
        .create_request(guest, event.id)
        .await
        .expect("request after cancellation should succeed");
    assert_ne!(second.id, first.id);
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_unlimited_event_auto_confirms() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let guest = db.insert_user("Guest").await;
    let category = db.insert_category("Lectures").await;

    // limit 0 overrides the moderation flag
    let event = services
        .event_service
        .create_event(owner, new_event_payload(category, 4, 0, true))
        .await
        .unwrap();
    services
        .event_service
        .update_event_by_admin(event.id, publish())
        .await
        .unwrap();

    let request = services
        .request_service
        .create_request(guest, event.id)
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Confirmed);

    // with no limit there is nothing to moderate
    assert_matches!(
        services
            .request_service
            .change_request_status(
                owner,
                event.id,
                StatusUpdate {
                    request_ids: vec![request.id],
                    status: ModerationStatus::Rejected,
                },
            )
            .await,
        Err(AfishaError::Conflict(_))
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_published_events_are_locked_down() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let category = db.insert_category("Exhibitions").await;

    let event = services
        .event_service
        .create_event(owner, new_event_payload(category, 6, 0, false))
        .await
        .unwrap();
    services
        .event_service
        .update_event_by_admin(event.id, publish())
        .await
        .unwrap();

    // publishing is not idempotent: the event is no longer pending
    assert_matches!(
        services
            .event_service
            .update_event_by_admin(event.id, publish())
            .await,
        Err(AfishaError::Conflict(_))
    );

    // rejecting a published event is forbidden
    assert_matches!(
        services
            .event_service
            .update_event_by_admin(
                event.id,
                UpdateEventByAdmin {
                    state_action: Some(AdminStateAction::RejectEvent),
                    ..Default::default()
                },
            )
            .await,
        Err(AfishaError::Conflict(_))
    );

    // owner edits of a published event always conflict
    let update = UpdateEventByOwner {
        patch: afisha::models::event::EventPatch {
            title: Some("Completely new title".to_string()),
            ..Default::default()
        },
        state_action: None,
    };
    assert_matches!(
        services
            .event_service
            .update_event_by_owner(owner, event.id, update)
            .await,
        Err(AfishaError::Conflict(_))
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_bulk_moderation_is_all_or_nothing() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let category = db.insert_category("Workshops").await;

    let event = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 2, true))
        .await
        .unwrap();
    services
        .event_service
        .update_event_by_admin(event.id, publish())
        .await
        .unwrap();

    let mut request_ids = Vec::new();
    for name in ["Ann", "Ben", "Cleo"] {
        let user = db.insert_user(name).await;
        let request = services
            .request_service
            .create_request(user, event.id)
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        request_ids.push(request.id);
    }

    // three confirmations against two slots: the whole batch aborts
    assert_matches!(
        services
            .request_service
            .change_request_status(
                owner,
                event.id,
                StatusUpdate {
                    request_ids: request_ids.clone(),
                    status: ModerationStatus::Confirmed,
                },
            )
            .await,
        Err(AfishaError::Conflict(_))
    );

    let still_pending = services
        .request_service
        .get_event_requests(owner, event.id)
        .await
        .unwrap();
    assert!(still_pending
        .iter()
        .all(|r| r.status == RequestStatus::Pending));

    // a batch that fits is applied and partitioned by outcome
    let confirmed = services
        .request_service
        .change_request_status(
            owner,
            event.id,
            StatusUpdate {
                request_ids: request_ids[..2].to_vec(),
                status: ModerationStatus::Confirmed,
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.confirmed_requests.len(), 2);

    // already-confirmed targets are terminal for the moderation endpoint
    assert_matches!(
        services
            .request_service
            .change_request_status(
                owner,
                event.id,
                StatusUpdate {
                    request_ids: request_ids[..1].to_vec(),
                    status: ModerationStatus::Rejected,
                },
            )
            .await,
        Err(AfishaError::Conflict(_))
    );

    let rejected = services
        .request_service
        .change_request_status(
            owner,
            event.id,
            StatusUpdate {
                request_ids: request_ids[2..].to_vec(),
                status: ModerationStatus::Rejected,
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.rejected_requests.len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_moderation_requires_ownership() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let stranger = db.insert_user("Stranger").await;
    let category = db.insert_category("Meetups").await;

    let event = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 5, true))
        .await
        .unwrap();

    assert_matches!(
        services
            .request_service
            .get_event_requests(stranger, event.id)
            .await,
        Err(AfishaError::Conflict(_))
    );
    assert_matches!(
        services
            .request_service
            .get_event_requests(owner, 9999)
            .await,
        Err(AfishaError::EventNotFound { .. })
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_enrich_one_matches_batch() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let guest = db.insert_user("Guest").await;
    let category = db.insert_category("Festivals").await;

    let first = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 0, false))
        .await
        .unwrap();
    let second = services
        .event_service
        .create_event(owner, new_event_payload(category, 6, 0, false))
        .await
        .unwrap();
    for event_id in [first.id, second.id] {
        services
            .event_service
            .update_event_by_admin(event_id, publish())
            .await
            .unwrap();
    }
    services
        .request_service
        .create_request(guest, first.id)
        .await
        .unwrap();

    // per-event stats served for both single and batch queries
    stats.server.reset().await;
    stats.mock_hit_ok().await;
    stats
        .mock_stats(vec![view_stat(first.id, 11), view_stat(second.id, 4)])
        .await;

    let batch = services
        .event_service
        .get_own_events(owner, 0, 10)
        .await
        .unwrap();
    for event_id in [first.id, second.id] {
        let single = services
            .event_service
            .get_own_event(owner, event_id)
            .await
            .unwrap();
        let from_batch = batch
            .iter()
            .find(|dto| dto.id == event_id)
            .expect("event missing from batch");
        assert_eq!(single.confirmed_requests, from_batch.confirmed_requests);
        assert_eq!(single.views, from_batch.views);
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a local Docker daemon"]
async fn test_public_search_availability_and_visibility() {
    let db = TestDatabase::new().await;
    let stats = StatsMockServer::new().await;
    let services = build_factory(&db, &stats).await;

    let owner = db.insert_user("Owner").await;
    let guest = db.insert_user("Guest").await;
    let category = db.insert_category("Theatre").await;

    // one full event (limit 1, auto-confirm) and one open event
    let full = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 1, false))
        .await
        .unwrap();
    let open = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 0, false))
        .await
        .unwrap();
    let draft = services
        .event_service
        .create_event(owner, new_event_payload(category, 5, 0, false))
        .await
        .unwrap();
    for event_id in [full.id, open.id] {
        services
            .event_service
            .update_event_by_admin(event_id, publish())
            .await
            .unwrap();
    }
    services
        .request_service
        .create_request(guest, full.id)
        .await
        .unwrap();

    let everything = services
        .public_event_service
        .search(
            PublicSearchFilter::default(),
            EventSort::EventDate,
            0,
            10,
            "10.0.0.1",
        )
        .await
        .unwrap();
    let ids: Vec<i64> = everything.iter().map(|d| d.id).collect();
    assert!(ids.contains(&full.id));
    assert!(ids.contains(&open.id));
    // pending events are publicly invisible
    assert!(!ids.contains(&draft.id));

    let available = services
        .public_event_service
        .search(
            PublicSearchFilter {
                only_available: true,
                ..Default::default()
            },
            EventSort::EventDate,
            0,
            10,
            "10.0.0.1",
        )
        .await
        .unwrap();
    let ids: Vec<i64> = available.iter().map(|d| d.id).collect();
    assert!(!ids.contains(&full.id));
    assert!(ids.contains(&open.id));

    // single public read: published only
    assert_matches!(
        services
            .public_event_service
            .get_published_event(draft.id, "10.0.0.1")
            .await,
        Err(AfishaError::EventNotFound { .. })
    );
    let dto = services
        .public_event_service
        .get_published_event(open.id, "10.0.0.1")
        .await
        .unwrap();
    assert_eq!(dto.id, open.id);
    assert!(dto.published_at.is_some());
}
