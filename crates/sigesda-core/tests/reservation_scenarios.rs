//! Room 1 walkthrough using only the public API of sigesda-core.

use chrono::{DateTime, TimeZone, Utc};
use sigesda_core::models::{Reservation, ReservationCandidate, ReservationStatus};
use sigesda_core::{
    apply_action, detect_conflicts, ensure_no_conflicts, next_allowed_actions, AppError,
    ReservationAction,
};
use uuid::Uuid;

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
}

fn confirmed(room_id: Uuid, start: u32, end: u32) -> Reservation {
    Reservation {
        id: Uuid::new_v4(),
        room_id,
        requester_id: Uuid::new_v4(),
        activity_id: None,
        start_time: at(start),
        end_time: at(end),
        status: ReservationStatus::Confirmed,
        observations: None,
        cancellation_reason: None,
        rejection_reason: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn room_one_day() {
    let room_1 = Uuid::new_v4();
    let a = confirmed(room_1, 10, 12);
    let existing = vec![a.clone()];

    let b = ReservationCandidate::new(room_1, at(11), at(13));
    assert_eq!(detect_conflicts(&b, &existing, None), vec![a.clone()]);
    match ensure_no_conflicts(&b, &existing, None) {
        Err(AppError::Conflict { room_id, conflicts }) => {
            assert_eq!(room_id, room_1);
            assert_eq!(conflicts, vec![a.clone()]);
        }
        other => panic!("expected a conflict, got {other:?}"),
    }

    let c = ReservationCandidate::new(room_1, at(12), at(13));
    assert!(detect_conflicts(&c, &existing, None).is_empty());

    // Once A is cancelled the slot is free again.
    assert_eq!(
        next_allowed_actions(a.status),
        vec![ReservationAction::Cancel]
    );
    let cancelled = apply_action(&a, ReservationAction::Cancel, Some("Teacher ill")).unwrap();
    assert!(detect_conflicts(&b, &[cancelled.clone()], None).is_empty());
    assert!(next_allowed_actions(cancelled.status).is_empty());
}
