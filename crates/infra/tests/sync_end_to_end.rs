//! End-to-end reconciliation: mock provider -> HTTP transport -> SQLite
//! task store, exercising the full engine wiring.

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use support::{credential, test_config, TestDatabase, USER};
use tandem_core::{CalendarSyncService, CredentialRepository, SettingsRepository};
use tandem_infra::{GoogleCalendarClient, TokenManager};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS_PATH: &str = "/calendar/v3/calendars/primary/events";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn service_with(db: &TestDatabase, server: &MockServer) -> CalendarSyncService {
    let credentials: Arc<dyn CredentialRepository> = Arc::new(db.credential_repository());
    credentials
        .upsert(&credential(USER, Some(3600)))
        .await
        .expect("credential seeded");
    let config = test_config(&server.uri());
    let tokens = TokenManager::new(credentials, config.clone()).expect("token manager");
    let transport = GoogleCalendarClient::new(tokens, config).expect("client");

    let settings = db.settings_repository();
    settings
        .set_user_timezone(USER, "America/Sao_Paulo")
        .await
        .expect("timezone stored");

    CalendarSyncService::new(
        Arc::new(transport),
        Arc::new(db.task_repository()),
        Arc::new(db.settings_repository()),
    )
}

#[tokio::test]
async fn window_sync_is_idempotent_through_the_full_stack() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "evt1",
                    "summary": "Standup",
                    "start": { "dateTime": "2024-03-10T07:30:00Z" },
                    "end": { "dateTime": "2024-03-10T08:00:00Z" }
                },
                {
                    "id": "evt2",
                    "summary": "Offsite",
                    "start": { "date": "2024-03-11" },
                    "end": { "date": "2024-03-12" }
                }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let service = service_with(&db, &server).await;

    let seen = service
        .sync_window(USER, date(2024, 3, 10), date(2024, 3, 16))
        .await
        .unwrap();
    assert_eq!(seen, 2);

    let listing_tasks = db.task_repository();
    let first = tandem_core::TaskRepository::list_in_range(
        &listing_tasks,
        USER,
        date(2024, 3, 10),
        date(2024, 3, 16),
        false,
    )
    .await
    .unwrap();
    assert_eq!(first.len(), 2);
    // Timed event converted to the configured timezone.
    assert_eq!(first[0].title, "Standup");
    assert_eq!(first[0].scheduled_date, Some(date(2024, 3, 10)));
    assert_eq!(
        first[0].scheduled_time.map(|t| t.to_string()),
        Some("04:30:00".to_string())
    );
    assert_eq!(first[1].title, "Offsite");
    assert_eq!(first[1].scheduled_time, None);

    // Second pass over the same window changes nothing.
    service
        .sync_window(USER, date(2024, 3, 10), date(2024, 3, 16))
        .await
        .unwrap();
    let second = tandem_core::TaskRepository::list_in_range(
        &listing_tasks,
        USER,
        date(2024, 3, 10),
        date(2024, 3, 16),
        false,
    )
    .await
    .unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(first[0].id, second[0].id);
    assert_eq!(first[1].id, second[1].id);
}

#[tokio::test]
async fn listing_degrades_when_provider_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let service = service_with(&db, &server).await;

    let listing = service
        .list_tasks_synced(USER, date(2024, 3, 10), date(2024, 3, 16), false)
        .await
        .unwrap();
    assert!(listing.tasks.is_empty());
    assert!(listing.sync_warning.is_some());
}
