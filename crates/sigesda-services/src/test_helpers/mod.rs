//! Test helpers for service tests
//!
//! This module provides an in-memory [`sigesda_core::ReservationSource`] and
//! fixtures, so services can be tested without a backend.

pub mod in_memory_source;

pub use in_memory_source::InMemoryReservationSource;

use chrono::{DateTime, TimeZone, Utc};
use sigesda_core::models::{Reservation, ReservationStatus, Room};
use uuid::Uuid;

/// 2 March 2026 at `hour:minute` UTC
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

pub fn room(name: &str) -> Room {
    Room {
        id: Uuid::new_v4(),
        name: name.to_string(),
        room_type: "classroom".to_string(),
        capacity: 20,
        available: true,
    }
}

pub fn reservation(
    room_id: Uuid,
    requester_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: ReservationStatus,
) -> Reservation {
    Reservation {
        id: Uuid::new_v4(),
        room_id,
        requester_id,
        activity_id: None,
        start_time: start,
        end_time: end,
        status,
        observations: None,
        cancellation_reason: None,
        rejection_reason: None,
        created_at: None,
        updated_at: None,
    }
}
