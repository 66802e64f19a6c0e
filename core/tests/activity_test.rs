//! Activity engine tests: creation, duplicate detection, window validation,
//! quota top-ups, and whole-unit atomicity.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::{Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::rngs::mock::StepRng;
use serialkit_core::mocks::{FixedClock, MemoryStore};
use serialkit_core::{
    ActivityEngine, AddQuota, Clock, CreateActivity, SerialError, SerialStatus, ValidityWindow,
};

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap())
}

fn window_days(from_now: i64, until: i64) -> ValidityWindow {
    let now = clock().now();
    ValidityWindow::new(now + Duration::days(from_now), now + Duration::days(until))
}

fn engine(store: &MemoryStore) -> ActivityEngine<MemoryStore, FixedClock, StdRng> {
    ActivityEngine::new(store.clone(), clock(), StdRng::seed_from_u64(1))
}

fn create_request(unique_id: &str, quota: u32) -> CreateActivity {
    CreateActivity {
        name: "2025 member campaign".to_string(),
        unique_id: unique_id.to_string(),
        window: window_days(0, 30),
        quota,
    }
}

#[tokio::test]
async fn create_activity_persists_activity_and_serials() {
    let store = MemoryStore::new();
    let receipt = engine(&store).create_activity(create_request("EVENT_2025_01", 50)).await.unwrap();

    assert_eq!(receipt.generated, 50);

    let activity = store.activity("EVENT_2025_01").await.unwrap();
    assert_eq!(activity.id, receipt.activity_id);
    assert_eq!(activity.quota, 50);
    assert_eq!(activity.window, window_days(0, 30));

    let serials = store.serials_for_activity(receipt.activity_id).await;
    assert_eq!(serials.len(), 50);
    for serial in &serials {
        assert_eq!(serial.status, SerialStatus::Unused);
        assert_eq!(serial.note, None);
        assert_eq!(serial.window, activity.window);
        assert!(serial.code.is_well_formed());
    }
}

#[tokio::test]
async fn duplicate_unique_id_persists_nothing() {
    let store = MemoryStore::new();
    let engine = engine(&store);
    engine.create_activity(create_request("EVENT_2025_01", 10)).await.unwrap();

    let err = engine.create_activity(create_request("EVENT_2025_01", 10)).await.unwrap_err();
    assert_eq!(err, SerialError::DuplicateActivity { unique_id: "EVENT_2025_01".to_string() });

    assert_eq!(store.activity_count().await, 1);
    assert_eq!(store.serial_count().await, 10);
}

#[tokio::test]
async fn window_end_before_start_is_rejected() {
    let store = MemoryStore::new();
    let mut request = create_request("EVENT_2025_01", 10);
    request.window = window_days(10, 5);

    let err = engine(&store).create_activity(request).await.unwrap_err();
    assert_eq!(err, SerialError::WindowEndBeforeStart);
    assert_eq!(store.activity_count().await, 0);
}

#[tokio::test]
async fn window_ending_in_the_past_is_rejected() {
    let store = MemoryStore::new();
    let mut request = create_request("EVENT_2025_01", 10);
    request.window = window_days(-30, -1);

    let err = engine(&store).create_activity(request).await.unwrap_err();
    assert_eq!(err, SerialError::WindowEndInPast);
    assert_eq!(store.activity_count().await, 0);
}

#[tokio::test]
async fn add_quota_tops_up_and_leaves_existing_serials_untouched() {
    let store = MemoryStore::new();
    let engine = engine(&store);
    let receipt = engine.create_activity(create_request("EVENT_2025_01", 50)).await.unwrap();
    let original_window = window_days(0, 30);
    let new_window = window_days(5, 90);

    let top_up = engine
        .add_quota(AddQuota {
            unique_id: "EVENT_2025_01".to_string(),
            window: new_window,
            quota: 20,
            note: "extended campaign".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(top_up.activity_id, receipt.activity_id);
    assert_eq!(top_up.generated, 20);

    let activity = store.activity("EVENT_2025_01").await.unwrap();
    assert_eq!(activity.quota, 70);
    assert_eq!(activity.window, new_window);

    let serials = store.serials_for_activity(receipt.activity_id).await;
    assert_eq!(serials.len(), 70);

    let old_batch: Vec<_> = serials.iter().filter(|s| s.note.is_none()).collect();
    let new_batch: Vec<_> =
        serials.iter().filter(|s| s.note.as_deref() == Some("extended campaign")).collect();
    assert_eq!(old_batch.len(), 50);
    assert_eq!(new_batch.len(), 20);
    for serial in old_batch {
        assert_eq!(serial.window, original_window, "old windows must stay snapshots");
    }
    for serial in new_batch {
        assert_eq!(serial.window, new_window);
        assert_eq!(serial.status, SerialStatus::Unused);
    }
}

#[tokio::test]
async fn add_quota_for_unknown_activity_fails() {
    let store = MemoryStore::new();
    let err = engine(&store)
        .add_quota(AddQuota {
            unique_id: "NOPE".to_string(),
            window: window_days(0, 30),
            quota: 5,
            note: "n/a".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err, SerialError::ActivityNotFound { unique_id: "NOPE".to_string() });
}

#[tokio::test]
async fn failed_allocation_rolls_back_the_whole_unit() {
    let store = MemoryStore::new();

    // A constant entropy source always draws A0000000. The first activity
    // claims it; the second can never fill its batch and must exhaust the
    // draw budget.
    let first = ActivityEngine::new(store.clone(), clock(), StepRng::new(0, 0));
    first.create_activity(create_request("EVENT_A", 1)).await.unwrap();

    let second = ActivityEngine::new(store.clone(), clock(), StepRng::new(0, 0));
    let err = second.create_activity(create_request("EVENT_B", 1)).await.unwrap_err();
    assert!(matches!(err, SerialError::CodespaceExhausted { .. }), "got {err:?}");

    // The second activity's insert happened inside the failed transaction
    // and must not survive it.
    assert_eq!(store.activity_count().await, 1);
    assert_eq!(store.serial_count().await, 1);
    assert!(store.activity("EVENT_B").await.is_none());
}
