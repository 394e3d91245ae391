//! Integration tests for the session workflow over the SQLite store.
//!
//! These tests drive a full session the way the CLI does: identity, storage,
//! evaluation and persistence together, then reopen the database to check
//! what actually survived.

use chrono::Utc;
use smokeless_core::push::{DeliveryReport, PushGateway, PushRegistration};
use smokeless_core::stats::DAY_MS;
use smokeless_core::{
    Aggregator, CoreError, FileIdentity, ManualClock, NoopPushGateway, Session, SessionOptions,
    SettingsPatch, SqliteStore, StaticIdentity, Store,
};
use std::cell::RefCell;

// Wed 2024-03-13 12:00:00 UTC
const NOON: i64 = 1_710_331_200_000;
const USER: &str = "smokeless-integration";

fn options() -> SessionOptions<Utc> {
    SessionOptions::with_aggregator(Aggregator::new(Utc))
}

/// Records every fan-out and reports each recipient as delivered.
#[derive(Default)]
struct RecordingGateway {
    sent: RefCell<Vec<(usize, String, String)>>,
}

impl PushGateway for RecordingGateway {
    fn broadcast(&self, recipients: &[PushRegistration], title: &str, body: &str) -> DeliveryReport {
        self.sent
            .borrow_mut()
            .push((recipients.len(), title.to_string(), body.to_string()));
        DeliveryReport {
            success_count: recipients.len(),
            failed_count: 0,
        }
    }
}

#[test]
fn test_events_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("smokeless.db");
    let clock = ManualClock::new(NOON);

    {
        let store = SqliteStore::open_at(&db_path).unwrap();
        let mut session = Session::start(
            &StaticIdentity(USER.into()),
            store,
            NoopPushGateway,
            &clock,
            options(),
        )
        .unwrap();
        session.log_event().unwrap();
        clock.advance(60_000);
        session.log_event().unwrap();
    }

    let store = SqliteStore::open_at(&db_path).unwrap();
    let session = Session::start(
        &StaticIdentity(USER.into()),
        store,
        NoopPushGateway,
        &clock,
        options(),
    )
    .unwrap();
    assert_eq!(session.events().len(), 2);
    assert_eq!(session.today_count(), 2);
    assert!(session.events()[0].timestamp < session.events()[1].timestamp);
}

#[test]
fn test_file_identity_keys_the_data() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON);
    let identity = FileIdentity::new(dir.path());

    let mut session =
        Session::start(&identity, &store, NoopPushGateway, &clock, options()).unwrap();
    session.log_event().unwrap();
    let user_id = session.user_id().to_string();
    assert!(user_id.starts_with("smokeless-"));

    let again = Session::start(&identity, &store, NoopPushGateway, &clock, options()).unwrap();
    assert_eq!(again.user_id(), user_id);
    assert_eq!(again.events().len(), 1);
    assert!(store.list_events("someone-else").unwrap().is_empty());
}

#[test]
fn test_unlock_survives_regression_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("smokeless.db");
    let clock = ManualClock::new(NOON);

    {
        let store = SqliteStore::open_at(&db_path).unwrap();
        let mut session = Session::start(
            &StaticIdentity(USER.into()),
            store,
            NoopPushGateway,
            &clock,
            options(),
        )
        .unwrap();
        let outcome = session.log_event().unwrap();
        assert!(outcome.unlocked.iter().any(|id| id == "first_day"));

        // Blow through the limit: streak drops to zero
        session
            .update_settings(&SettingsPatch {
                daily_limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        clock.advance(60_000);
        session.log_event().unwrap();
        clock.advance(60_000);
        session.log_event().unwrap();
    }

    let store = SqliteStore::open_at(&db_path).unwrap();
    let stored = store.list_achievements(USER).unwrap();
    let first_day = stored.iter().find(|s| s.id == "first_day").unwrap();
    assert_eq!(first_day.unlocked_at, Some(NOON));
}

#[test]
fn test_settings_patch_merges_and_persists() {
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON);
    let mut session = Session::start(
        &StaticIdentity(USER.into()),
        &store,
        NoopPushGateway,
        &clock,
        options(),
    )
    .unwrap();

    let patch = SettingsPatch::parse(None, Some("80,50"), None, Some("  Deniz ")).unwrap();
    session.update_settings(&patch).unwrap();

    let stored = store.get_settings(USER).unwrap().unwrap();
    assert_eq!(stored.daily_limit, 20);
    assert_eq!(stored.pack_price, 80.5);
    assert_eq!(stored.user_name, "Deniz");
}

#[test]
fn test_savings_flow_over_days() {
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON - 3 * DAY_MS);
    let mut session = Session::start(
        &StaticIdentity(USER.into()),
        &store,
        NoopPushGateway,
        &clock,
        options(),
    )
    .unwrap();
    session
        .update_settings(&SettingsPatch {
            daily_limit: Some(10),
            pack_price: Some(100.0),
            cigarettes_per_pack: Some(20),
            ..Default::default()
        })
        .unwrap();
    session.log_event().unwrap();

    clock.set(NOON);
    // 3 days elapsed, 10/day expected, 1 smoked: 29 not smoked at 5.0 each
    assert_eq!(session.total_saved(), 145.0);
    assert_eq!(session.daily_average(), 0.3);

    session.log_event().unwrap();
    let save_100 = session
        .achievements()
        .iter()
        .find(|s| s.id == "save_100")
        .unwrap();
    assert!(save_100.unlocked_at.is_some());
    assert_eq!(session.total_saved(), 140.0);
}

#[test]
fn test_broadcast_fans_out_to_all_registrations() {
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON);
    for (user, token) in [("a", "tok-a"), ("b", "tok-b")] {
        store
            .upsert_push_token(&PushRegistration {
                user_id: user.into(),
                token: token.into(),
                platform: "android".into(),
                updated_at: NOON,
            })
            .unwrap();
    }

    let gateway = RecordingGateway::default();
    let mut session = Session::start(
        &StaticIdentity(USER.into()),
        &store,
        &gateway,
        &clock,
        options().with_admin(USER),
    )
    .unwrap();

    let report = session.send_broadcast("  Hello ", "Stay strong").unwrap();
    assert_eq!(report.success_count, 2);
    assert_eq!(
        gateway.sent.borrow().as_slice(),
        &[(2, "Hello".to_string(), "Stay strong".to_string())]
    );
    assert_eq!(store.list_recent_broadcasts(20).unwrap()[0].title, "Hello");
}

#[test]
fn test_broadcast_window_is_bounded_and_descending() {
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON);
    let mut session = Session::start(
        &StaticIdentity(USER.into()),
        &store,
        NoopPushGateway,
        &clock,
        options().with_admin(USER),
    )
    .unwrap();

    for i in 0..25 {
        clock.advance(1_000);
        session.send_broadcast(&format!("title {i}"), "body").unwrap();
    }
    session.refresh();

    let list = session.broadcasts();
    assert_eq!(list.len(), 20);
    assert_eq!(list[0].title, "title 24");
    assert!(list.windows(2).all(|w| w[0].sent_at > w[1].sent_at));
}

#[test]
fn test_non_admin_cannot_broadcast() {
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON);
    let gateway = RecordingGateway::default();
    let mut session = Session::start(
        &StaticIdentity(USER.into()),
        &store,
        &gateway,
        &clock,
        options().with_admin("smokeless-admin"),
    )
    .unwrap();

    let err = session.send_broadcast("Hello", "Stay strong").unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));
    assert!(gateway.sent.borrow().is_empty());
    assert!(store.list_recent_broadcasts(20).unwrap().is_empty());
}

#[test]
fn test_reset_all_over_sqlite() {
    let store = SqliteStore::open_memory().unwrap();
    let clock = ManualClock::new(NOON);
    let mut session = Session::start(
        &StaticIdentity(USER.into()),
        &store,
        NoopPushGateway,
        &clock,
        options(),
    )
    .unwrap();
    session.log_event().unwrap();
    session.complete_crisis().unwrap();

    session.reset_all().unwrap();

    assert!(store.list_events(USER).unwrap().is_empty());
    assert!(session
        .achievements()
        .iter()
        .all(|s| s.unlocked_at.is_none() && s.progress == 0));
    assert_eq!(store.list_achievements(USER).unwrap().len(), 12);
    assert_eq!(session.settings().daily_limit, 20);
}
