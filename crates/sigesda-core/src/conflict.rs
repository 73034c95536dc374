//! Overlap detection between reservations of the same room.
//!
//! Intervals are half-open: `[start, end)`. Two reservations that merely touch
//! (one ends at 12:00, the next starts at 12:00) do not conflict. Only
//! reservations whose status still holds the room take part in the check.
//!
//! The result is advisory. It is computed against a snapshot of the room's
//! reservations; the backend re-checks when persisting.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Reservation, ReservationCandidate, ReservationWindow};

/// Whether `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Return every reservation in `existing` that conflicts with `candidate`.
///
/// A reservation conflicts when it is in the candidate's room, its id is not
/// `exclude_id` (the reservation being edited), it still holds the room
/// (pending or confirmed) and its interval intersects the candidate's.
/// The result is sorted by start time, then id.
pub fn detect_conflicts(
    candidate: &ReservationCandidate,
    existing: &[Reservation],
    exclude_id: Option<Uuid>,
) -> Vec<Reservation> {
    let mut conflicts: Vec<Reservation> = existing
        .iter()
        .filter(|r| r.room_id == candidate.room_id)
        .filter(|r| Some(r.id) != exclude_id)
        .filter(|r| r.status.holds_room())
        .filter(|r| {
            intervals_overlap(
                candidate.start_time,
                candidate.end_time,
                r.start_time,
                r.end_time,
            )
        })
        .cloned()
        .collect();

    conflicts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
    conflicts
}

/// Like [`detect_conflicts`], but fails with [`AppError::Conflict`] when any are found.
pub fn ensure_no_conflicts(
    candidate: &ReservationCandidate,
    existing: &[Reservation],
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let conflicts = detect_conflicts(candidate, existing, exclude_id);
    if conflicts.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        room_id = %candidate.room_id,
        conflict_count = conflicts.len(),
        "Candidate reservation overlaps existing reservations"
    );

    Err(AppError::Conflict {
        room_id: candidate.room_id,
        conflicts,
    })
}

/// Reservations of `room_id` intersecting `window` (or all of them when no
/// window is given), sorted by start time. Status is not filtered.
pub fn reservations_in_window(
    existing: &[Reservation],
    room_id: Uuid,
    window: Option<&ReservationWindow>,
) -> Vec<Reservation> {
    let mut found: Vec<Reservation> = existing
        .iter()
        .filter(|r| r.room_id == room_id)
        .filter(|r| match window {
            Some(w) => intervals_overlap(w.from, w.to, r.start_time, r.end_time),
            None => true,
        })
        .cloned()
        .collect();

    found.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
    found
}
