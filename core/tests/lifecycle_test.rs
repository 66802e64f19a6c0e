//! Lifecycle engine tests: redeem guards, window boundaries, and
//! partial-success batch cancellation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serialkit_core::mocks::{FixedClock, MemoryStore};
use serialkit_core::{
    ActivityId, LifecycleEngine, NewActivity, NewSerial, SerialCode, SerialError, SerialStatus,
    Store, StoreTx, ValidityWindow,
};
use serialkit_core::engine::lifecycle::{
    MSG_ALL_CANCELLED, MSG_ALL_FAILED, MSG_PARTIAL, REASON_ALREADY_CANCELLED,
    REASON_ALREADY_REDEEMED, REASON_NOT_FOUND,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap()
}

fn open_window() -> ValidityWindow {
    ValidityWindow::new(now() - Duration::days(1), now() + Duration::days(30))
}

/// Insert an activity owning the given codes, all `Unused`.
async fn seed(store: &MemoryStore, unique_id: &str, codes: &[&str], window: ValidityWindow) -> ActivityId {
    let mut tx = store.begin().await.unwrap();
    let activity = tx
        .insert_activity(NewActivity {
            unique_id: unique_id.to_string(),
            name: "seeded".to_string(),
            window,
            quota: u32::try_from(codes.len()).unwrap(),
            created_at: now() - Duration::days(1),
        })
        .await
        .unwrap();
    let serials = codes
        .iter()
        .map(|code| NewSerial {
            activity_id: activity.id,
            code: SerialCode::normalized(code),
            note: None,
            window,
            created_at: now() - Duration::days(1),
        })
        .collect();
    tx.insert_serials(serials).await.unwrap();
    tx.commit().await.unwrap();
    activity.id
}

fn engine(store: &MemoryStore) -> LifecycleEngine<MemoryStore, FixedClock> {
    LifecycleEngine::new(store.clone(), FixedClock::new(now()))
}

#[tokio::test]
async fn redeem_transitions_unused_to_redeemed() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001"], open_window()).await;

    let redemption = engine(&store).redeem("A0000001").await.unwrap();
    assert_eq!(redemption.code.as_str(), "A0000001");
    assert_eq!(redemption.redeemed_at, now());

    let serial = store.serial("A0000001").await.unwrap();
    assert_eq!(serial.status, SerialStatus::Redeemed);
    assert_eq!(serial.updated_at, now());
}

#[tokio::test]
async fn redeem_normalizes_case_and_whitespace() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001"], open_window()).await;

    let redemption = engine(&store).redeem("  a0000001 ").await.unwrap();
    assert_eq!(redemption.code.as_str(), "A0000001");
}

#[tokio::test]
async fn second_redeem_fails_and_leaves_the_serial_unchanged() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001"], open_window()).await;
    let engine = engine(&store);

    engine.redeem("A0000001").await.unwrap();
    let before = store.serial("A0000001").await.unwrap();

    let err = engine.redeem("A0000001").await.unwrap_err();
    assert_eq!(err, SerialError::AlreadyRedeemed);
    assert_eq!(store.serial("A0000001").await.unwrap(), before);
}

#[tokio::test]
async fn redeeming_a_cancelled_serial_fails() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001"], open_window()).await;
    let engine = engine(&store);

    engine.cancel_batch(&["A0000001".to_string()], "pulled").await.unwrap();
    let err = engine.redeem("A0000001").await.unwrap_err();
    assert_eq!(err, SerialError::AlreadyCancelled);
}

#[tokio::test]
async fn redeeming_an_unknown_code_fails() {
    let store = MemoryStore::new();
    let err = engine(&store).redeem("Z9999999").await.unwrap_err();
    assert_eq!(err, SerialError::SerialNotFound);
}

#[tokio::test]
async fn redeem_before_window_start_fails() {
    let store = MemoryStore::new();
    let window = ValidityWindow::new(now() + Duration::hours(1), now() + Duration::days(30));
    seed(&store, "E1", &["A0000001"], window).await;

    let err = engine(&store).redeem("A0000001").await.unwrap_err();
    assert_eq!(err, SerialError::NotYetValid);
    assert_eq!(store.serial("A0000001").await.unwrap().status, SerialStatus::Unused);
}

#[tokio::test]
async fn redeem_exactly_at_window_start_succeeds() {
    let store = MemoryStore::new();
    let window = ValidityWindow::new(now(), now() + Duration::days(30));
    seed(&store, "E1", &["A0000001"], window).await;

    assert!(engine(&store).redeem("A0000001").await.is_ok());
}

#[tokio::test]
async fn redeem_at_or_after_window_end_fails() {
    let store = MemoryStore::new();
    let window = ValidityWindow::new(now() - Duration::days(30), now());
    seed(&store, "E1", &["A0000001"], window).await;

    let err = engine(&store).redeem("A0000001").await.unwrap_err();
    assert_eq!(err, SerialError::Expired);
    assert_eq!(store.serial("A0000001").await.unwrap().status, SerialStatus::Unused);
}

#[tokio::test]
async fn cancel_batch_deduplicates_and_itemizes_results() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001"], open_window()).await;

    let codes = vec![
        "AAAAAAAA".to_string(),
        "A0000001".to_string(),
        "A0000001".to_string(),
    ];
    let outcome = engine(&store).cancel_batch(&codes, "campaign ended early").await.unwrap();

    assert_eq!(outcome.cancelled.len(), 1);
    assert_eq!(outcome.cancelled[0].as_str(), "A0000001");
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].code.as_str(), "AAAAAAAA");
    assert_eq!(outcome.failed[0].reason, REASON_NOT_FOUND);
    assert_eq!(outcome.summary(), MSG_PARTIAL);
    assert_eq!(outcome.cancelled_at, now());

    let serial = store.serial("A0000001").await.unwrap();
    assert_eq!(serial.status, SerialStatus::Cancelled);
    assert_eq!(serial.note.as_deref(), Some("campaign ended early"));
    assert_eq!(serial.updated_at, now());
}

#[tokio::test]
async fn malformed_codes_reject_the_whole_batch_before_any_mutation() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001"], open_window()).await;

    let codes = vec!["A0000001".to_string(), "TOO_LONG_CODE".to_string(), "AB".to_string()];
    let err = engine(&store).cancel_batch(&codes, "note").await.unwrap_err();

    match err {
        SerialError::InvalidFormat { violations } => {
            assert_eq!(violations.len(), 2);
            assert_eq!(violations[0].index, 1);
            assert_eq!(violations[0].value, "TOO_LONG_CODE");
            assert_eq!(violations[1].index, 2);
            assert_eq!(violations[1].value, "AB");
        }
        other => panic!("expected InvalidFormat, got {other:?}"),
    }

    // The well-formed entry must not have been touched.
    assert_eq!(store.serial("A0000001").await.unwrap().status, SerialStatus::Unused);
}

#[tokio::test]
async fn cancelling_every_code_reports_full_success() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001", "B0000002"], open_window()).await;

    let codes = vec!["A0000001".to_string(), "B0000002".to_string()];
    let outcome = engine(&store).cancel_batch(&codes, "note").await.unwrap();

    assert_eq!(outcome.summary(), MSG_ALL_CANCELLED);
    assert_eq!(outcome.cancelled.len(), 2);
    assert!(outcome.failed.is_empty());
}

#[tokio::test]
async fn conflicting_codes_report_their_specific_reasons() {
    let store = MemoryStore::new();
    seed(&store, "E1", &["A0000001", "B0000002"], open_window()).await;
    let engine = engine(&store);

    engine.redeem("A0000001").await.unwrap();
    engine.cancel_batch(&["B0000002".to_string()], "first pass").await.unwrap();

    let codes = vec!["A0000001".to_string(), "B0000002".to_string()];
    let outcome = engine.cancel_batch(&codes, "second pass").await.unwrap();

    assert_eq!(outcome.summary(), MSG_ALL_FAILED);
    assert!(outcome.cancelled.is_empty());
    assert_eq!(outcome.failed.len(), 2);
    assert_eq!(outcome.failed[0].reason, REASON_ALREADY_REDEEMED);
    assert_eq!(outcome.failed[1].reason, REASON_ALREADY_CANCELLED);

    // The redeemed serial must keep its status and lose nothing.
    assert_eq!(store.serial("A0000001").await.unwrap().status, SerialStatus::Redeemed);
    assert_eq!(store.serial("B0000002").await.unwrap().note.as_deref(), Some("first pass"));
}
