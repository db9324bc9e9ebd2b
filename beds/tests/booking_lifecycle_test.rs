//! Booking lifecycle tests against the in-memory bed store.
//!
//! Every test checks the ward counters directly after the operation under
//! test, so a broken release or a double decrement shows up as a wrong
//! number rather than a passing status code.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pocketcare_beds::booking::{BookingManager, CreateBookingRequest};
use pocketcare_beds::ledger::{BedCounts, WardUpsert, WardUpsertRequest};
use pocketcare_beds::mocks::InMemoryBedStore;
use pocketcare_beds::providers::{AllocationLogRepository, WardLedger};
use pocketcare_beds::types::{
    AcType, AllocationAction, BookingId, BookingStatus, HospitalId, RoomConfig, UserId, WardId,
    WardType,
};
use pocketcare_beds::BedError;
use std::sync::Arc;

const HOSPITAL: HospitalId = HospitalId(1);
const PATIENT: UserId = UserId(10);

fn setup() -> (Arc<InMemoryBedStore>, BookingManager<InMemoryBedStore>) {
    let store = Arc::new(InMemoryBedStore::new());
    store.add_hospital(HOSPITAL, "City General").unwrap();
    store.add_user(PATIENT, "Ana Costa", "ana@example.com").unwrap();
    let manager = BookingManager::new(Arc::clone(&store));
    (store, manager)
}

fn counts(total: i32, available: i32, occupied: i32) -> BedCounts {
    BedCounts {
        total_beds: total,
        available_beds: available,
        occupied_beds: occupied,
        reserved_beds: 0,
    }
}

/// Ward (hospital 1, general, non_ac) with 10 beds, 3 free.
fn seed_general_ward(store: &InMemoryBedStore) -> WardId {
    store
        .seed_ward(HOSPITAL, WardType::General, AcType::NonAc, None, counts(10, 3, 7))
        .unwrap()
}

fn general_request() -> CreateBookingRequest {
    CreateBookingRequest {
        hospital_id: Some(HOSPITAL.get()),
        ward_type: Some("general".into()),
        ac_type: Some("non_ac".into()),
        patient_name: Some("A".into()),
        patient_phone: Some("555".into()),
        admission_date: Some("2024-01-01".into()),
        ..CreateBookingRequest::default()
    }
}

fn ward_counts(store: &InMemoryBedStore, ward_id: WardId) -> BedCounts {
    store.ward(ward_id).unwrap().expect("ward exists").counts
}

// ============================================================================
// Creating bookings
// ============================================================================

#[tokio::test]
async fn test_bookings_drain_ward_then_capacity_is_exhausted() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);

    let first = manager.create_booking(PATIENT, general_request()).await.unwrap();
    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(first.ward_id, ward_id);
    assert_eq!(first.hospital_name, "City General");
    let after_first = ward_counts(&store, ward_id);
    assert_eq!(after_first.available_beds, 2);
    assert_eq!(after_first.reserved_beds, 1);

    for _ in 0..2 {
        manager.create_booking(PATIENT, general_request()).await.unwrap();
    }
    let drained = ward_counts(&store, ward_id);
    assert_eq!(drained.available_beds, 0);
    assert_eq!(drained.reserved_beds, 3);
    assert!(drained.is_balanced());

    for _ in 0..2 {
        let err = manager
            .create_booking(PATIENT, general_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BedError::CapacityExhausted {
                ward_type: WardType::General
            }
        ));
    }
    assert_eq!(store.booking_count().unwrap(), 3);
    assert_eq!(ward_counts(&store, ward_id), drained);
}

#[tokio::test]
async fn test_full_ward_inserts_no_booking() {
    let (store, manager) = setup();
    let ward_id = store
        .seed_ward(HOSPITAL, WardType::General, AcType::NonAc, None, counts(4, 0, 4))
        .unwrap();

    let err = manager.create_booking(PATIENT, general_request()).await.unwrap_err();

    assert!(matches!(err, BedError::CapacityExhausted { .. }));
    assert_eq!(store.booking_count().unwrap(), 0);
    assert_eq!(ward_counts(&store, ward_id), counts(4, 0, 4));
}

#[tokio::test]
async fn test_no_ward_for_requested_ac_type() {
    let (store, manager) = setup();
    seed_general_ward(&store);

    let err = manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                ac_type: Some("ac".into()),
                ..general_request()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BedError::CapacityExhausted { .. }));
}

#[tokio::test]
async fn test_icu_booking_ignores_ac_type() {
    let (store, manager) = setup();
    let icu = store
        .seed_ward(HOSPITAL, WardType::Icu, AcType::NotApplicable, None, counts(2, 2, 0))
        .unwrap();

    let confirmation = manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                ward_type: Some("icu".into()),
                ac_type: Some("ac".into()),
                ..general_request()
            },
        )
        .await
        .unwrap();

    assert_eq!(confirmation.ward_id, icu);
    assert_eq!(ward_counts(&store, icu).available_beds, 1);
}

#[tokio::test]
async fn test_unknown_hospital_is_not_found() {
    let (store, manager) = setup();
    seed_general_ward(&store);

    let err = manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                hospital_id: Some(99),
                ..general_request()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BedError::NotFound { resource: "Hospital", id: 99 }));
}

#[tokio::test]
async fn test_invalid_request_touches_nothing() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);

    let err = manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                patient_phone: None,
                ..general_request()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Missing required fields: patient_phone");
    assert_eq!(store.booking_count().unwrap(), 0);
    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));
}

#[tokio::test]
async fn test_patient_email_defaults_to_account_email() {
    let (store, manager) = setup();
    seed_general_ward(&store);

    let confirmation = manager.create_booking(PATIENT, general_request()).await.unwrap();

    let booking = store.booking(confirmation.booking_id).unwrap().unwrap();
    assert_eq!(booking.patient_email.as_deref(), Some("ana@example.com"));
    assert_eq!(booking.ward_id, Some(confirmation.ward_id));
}

#[tokio::test]
async fn test_losing_race_for_last_bed_leaves_no_booking() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    store.drain_before_next_reserve().unwrap();

    let err = manager.create_booking(PATIENT, general_request()).await.unwrap_err();

    assert!(matches!(err, BedError::CapacityExhausted { .. }));
    assert_eq!(store.booking_count().unwrap(), 0);
    let ward = ward_counts(&store, ward_id);
    assert_eq!(ward.available_beds, 0);
    assert_eq!(ward.reserved_beds, 0);
    assert!(ward.is_balanced());
}

#[tokio::test]
async fn test_allocation_log_failure_does_not_fail_booking() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    store.fail_log_appends(true).unwrap();

    manager.create_booking(PATIENT, general_request()).await.unwrap();

    assert_eq!(ward_counts(&store, ward_id).reserved_beds, 1);
    store.fail_log_appends(false).unwrap();
    assert!(store.list_logs(HOSPITAL, 50).await.unwrap().is_empty());
}

// ============================================================================
// Cancelling and status changes
// ============================================================================

#[tokio::test]
async fn test_cancel_returns_bed_and_logs_it() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;

    manager.cancel_booking(booking_id, PATIENT).await.unwrap();

    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));
    let booking = store.booking(booking_id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let logs = store.list_logs(HOSPITAL, 50).await.unwrap();
    let actions: Vec<AllocationAction> = logs.iter().map(|entry| entry.action).collect();
    assert_eq!(actions, vec![AllocationAction::Cancelled, AllocationAction::Reserved]);
    assert_eq!(logs[0].allocated_by.as_deref(), Some("user_10"));
    assert_eq!(logs[0].ward_id, Some(ward_id));
}

#[tokio::test]
async fn test_cancelling_terminal_booking_fails_and_keeps_counts() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let cancelled = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;
    let completed = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;
    manager.cancel_booking(cancelled, PATIENT).await.unwrap();
    manager
        .update_booking_status(completed, HOSPITAL, "completed", None)
        .await
        .unwrap();
    let before = ward_counts(&store, ward_id);

    let err = manager.cancel_booking(cancelled, PATIENT).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot cancel a cancelled booking");
    let err = manager.cancel_booking(completed, PATIENT).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot cancel a completed booking");
    assert!(matches!(err, BedError::InvalidState(_)));

    assert_eq!(ward_counts(&store, ward_id), before);
    assert_eq!(before, counts(10, 3, 7));
}

#[tokio::test]
async fn test_cannot_cancel_someone_elses_booking() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;

    let err = manager.cancel_booking(booking_id, UserId(11)).await.unwrap_err();

    assert!(matches!(err, BedError::NotFound { resource: "Booking", .. }));
    assert_eq!(ward_counts(&store, ward_id).reserved_beds, 1);
}

#[tokio::test]
async fn test_rejected_then_cancelled_releases_exactly_once() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;

    let status = manager
        .update_booking_status(booking_id, HOSPITAL, "rejected", Some("No specialist".into()))
        .await
        .unwrap();
    assert_eq!(status, BookingStatus::Rejected);
    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));

    manager.cancel_booking(booking_id, PATIENT).await.unwrap();

    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));
    let booking = store.booking(booking_id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.notes.as_deref(), Some("No specialist"));
}

#[tokio::test]
async fn test_status_is_validated_before_lookup() {
    let (_store, manager) = setup();

    for status in ["pending", "admitted", ""] {
        let err = manager
            .update_booking_status(BookingId(999), HOSPITAL, status, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid status");
    }
}

#[tokio::test]
async fn test_status_update_rules() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;

    let err = manager
        .update_booking_status(booking_id, HospitalId(2), "rejected", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BedError::NotFound { .. }));

    // Same status again only updates the notes
    manager
        .update_booking_status(booking_id, HOSPITAL, "confirmed", Some("Bed 4".into()))
        .await
        .unwrap();
    assert_eq!(ward_counts(&store, ward_id).reserved_beds, 1);

    manager
        .update_booking_status(booking_id, HOSPITAL, "rejected", None)
        .await
        .unwrap();
    let err = manager
        .update_booking_status(booking_id, HOSPITAL, "confirmed", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot confirm a rejected booking");

    manager
        .update_booking_status(booking_id, HOSPITAL, "completed", None)
        .await
        .unwrap();
    let err = manager
        .update_booking_status(booking_id, HOSPITAL, "cancelled", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot change a completed booking to cancelled");

    // Released once, on confirmed -> rejected
    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));
    let released = store
        .list_logs(HOSPITAL, 50)
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.action == AllocationAction::Released)
        .count();
    assert_eq!(released, 1);
}

#[tokio::test]
async fn test_legacy_booking_releases_by_ward_lookup() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;
    store
        .set_legacy_booking(booking_id, BookingStatus::Confirmed, None)
        .unwrap();

    manager
        .update_booking_status(booking_id, HOSPITAL, "completed", None)
        .await
        .unwrap();

    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));
}

#[tokio::test]
async fn test_cancelling_pending_booking_does_not_release() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;
    store
        .set_legacy_booking(booking_id, BookingStatus::Pending, Some(ward_id))
        .unwrap();

    manager.cancel_booking(booking_id, PATIENT).await.unwrap();

    let ward = ward_counts(&store, ward_id);
    assert_eq!(ward.available_beds, 2);
    assert_eq!(ward.reserved_beds, 1);
}

#[tokio::test]
async fn test_ledger_stays_balanced_across_mixed_operations() {
    let (store, manager) = setup();
    let general = seed_general_ward(&store);
    let icu = store
        .seed_ward(HOSPITAL, WardType::Icu, AcType::NotApplicable, None, counts(3, 2, 1))
        .unwrap();
    let icu_request = || CreateBookingRequest {
        ward_type: Some("icu".into()),
        ..general_request()
    };

    let mut held = Vec::new();
    for round in 0..12 {
        let request = if round % 3 == 0 { icu_request() } else { general_request() };
        if let Ok(confirmation) = manager.create_booking(PATIENT, request).await {
            held.push(confirmation.booking_id);
        }
        if round % 4 == 3 {
            if let Some(booking_id) = held.pop() {
                manager.cancel_booking(booking_id, PATIENT).await.unwrap();
            }
        }
        for ward_id in [general, icu] {
            assert!(ward_counts(&store, ward_id).is_balanced(), "round {round}");
        }
    }

    for booking_id in held {
        manager.cancel_booking(booking_id, PATIENT).await.unwrap();
    }
    assert_eq!(ward_counts(&store, general), counts(10, 3, 7));
    assert_eq!(ward_counts(&store, icu), counts(3, 2, 1));
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn test_private_room_bookings_group_by_room_config() {
    let (store, manager) = setup();
    store
        .seed_ward(
            HOSPITAL,
            WardType::PrivateRoom,
            AcType::NotApplicable,
            Some(RoomConfig::OneBedWithBath),
            counts(2, 2, 0),
        )
        .unwrap();
    seed_general_ward(&store);

    manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                ward_type: Some("private_room".into()),
                ac_type: Some("ac".into()),
                room_config: Some("1_bed_with_bath".into()),
                ..general_request()
            },
        )
        .await
        .unwrap();
    manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                admission_date: Some("2024-02-01".into()),
                ..general_request()
            },
        )
        .await
        .unwrap();
    manager.create_booking(PATIENT, general_request()).await.unwrap();

    let grouped = manager.list_bookings_by_ward(HOSPITAL).await.unwrap();

    let keys: Vec<&str> = grouped.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["general_non_ac", "private_1bed_with_bath"]);
    assert!(!grouped.contains_key("private_room"));

    let general = &grouped["general_non_ac"];
    assert_eq!(general.len(), 2);
    assert_eq!(general[0].admission_date.to_string(), "2024-02-01");
    assert_eq!(general[0].admission_reason, "Not specified");
    assert_eq!(general[0].booked_by.email, "ana@example.com");
    assert_eq!(general[0].booking_id, format!("BK-{:04}", general[0].id.get()));
}

#[tokio::test]
async fn test_by_ward_listing_only_shows_confirmed() {
    let (store, manager) = setup();
    seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;
    manager.cancel_booking(booking_id, PATIENT).await.unwrap();

    assert!(manager.list_bookings_by_ward(HOSPITAL).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hospital_listing_filters() {
    let (store, manager) = setup();
    seed_general_ward(&store);
    store
        .seed_ward(HOSPITAL, WardType::Icu, AcType::NotApplicable, None, counts(2, 2, 0))
        .unwrap();
    manager.create_booking(PATIENT, general_request()).await.unwrap();
    let icu = manager
        .create_booking(
            PATIENT,
            CreateBookingRequest {
                ward_type: Some("icu".into()),
                ..general_request()
            },
        )
        .await
        .unwrap()
        .booking_id;
    manager.cancel_booking(icu, PATIENT).await.unwrap();

    let all = manager.list_hospital_bookings(HOSPITAL, None, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].booking.id, icu);

    let cancelled = manager
        .list_hospital_bookings(HOSPITAL, Some("cancelled".into()), None)
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);

    let general = manager
        .list_hospital_bookings(HOSPITAL, None, Some("general".into()))
        .await
        .unwrap();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].user.name, "Ana Costa");

    let err = manager
        .list_hospital_bookings(HOSPITAL, Some("bogus".into()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BedError::Validation(_)));
}

#[tokio::test]
async fn test_user_listing_includes_hospital_details() {
    let (store, manager) = setup();
    seed_general_ward(&store);
    manager.create_booking(PATIENT, general_request()).await.unwrap();

    let bookings = manager.list_user_bookings(PATIENT).await.unwrap();

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].hospital_name, "City General");
    assert!(manager.list_user_bookings(UserId(11)).await.unwrap().is_empty());
}

// ============================================================================
// Ward CRUD alongside bookings
// ============================================================================

#[tokio::test]
async fn test_ward_edits_keep_booking_reservations() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    manager.create_booking(PATIENT, general_request()).await.unwrap();

    let upsert = WardUpsert::try_from(WardUpsertRequest {
        hospital_id: Some(HOSPITAL.get()),
        ward_type: Some("general".into()),
        ac_type: Some("non_ac".into()),
        total_beds: Some(12),
        occupied_beds: Some(7),
        ..WardUpsertRequest::default()
    })
    .unwrap();
    assert_eq!(store.upsert_ward(&upsert).await.unwrap(), ward_id);

    let ward = ward_counts(&store, ward_id);
    assert_eq!(ward.reserved_beds, 1);
    assert_eq!(ward.available_beds, 4);
    assert!(ward.is_balanced());
}

#[tokio::test]
async fn test_unbalanced_ward_edit_is_rejected() {
    let (store, _manager) = setup();
    let ward_id = seed_general_ward(&store);

    let upsert = WardUpsert::try_from(WardUpsertRequest {
        hospital_id: Some(HOSPITAL.get()),
        ward_type: Some("general".into()),
        ac_type: Some("non_ac".into()),
        total_beds: Some(10),
        available_beds: Some(5),
        occupied_beds: Some(7),
        ..WardUpsertRequest::default()
    })
    .unwrap();

    let err = store.upsert_ward(&upsert).await.unwrap_err();
    assert!(matches!(err, BedError::Validation(_)));
    assert_eq!(ward_counts(&store, ward_id), counts(10, 3, 7));
}

#[tokio::test]
async fn test_ward_holding_reservations_cannot_be_deleted() {
    let (store, manager) = setup();
    let ward_id = seed_general_ward(&store);
    let booking_id = manager
        .create_booking(PATIENT, general_request())
        .await
        .unwrap()
        .booking_id;

    let err = store.delete_ward(ward_id).await.unwrap_err();
    assert!(matches!(err, BedError::Conflict(_)));
    assert_eq!(ward_counts(&store, ward_id).reserved_beds, 1);

    manager.cancel_booking(booking_id, PATIENT).await.unwrap();
    store.delete_ward(ward_id).await.unwrap();
    assert!(store.ward(ward_id).unwrap().is_none());

    // Recreating the ward starts clean; the cancelled booking releases nothing.
    let upsert = WardUpsert::try_from(WardUpsertRequest {
        hospital_id: Some(HOSPITAL.get()),
        ward_type: Some("general".into()),
        ac_type: Some("non_ac".into()),
        total_beds: Some(10),
        occupied_beds: Some(7),
        ..WardUpsertRequest::default()
    })
    .unwrap();
    let recreated = store.upsert_ward(&upsert).await.unwrap();
    assert!(manager.cancel_booking(booking_id, PATIENT).await.is_err());
    let fresh = ward_counts(&store, recreated);
    assert_eq!(fresh, counts(10, 3, 7));
    assert!(fresh.is_balanced());
}
