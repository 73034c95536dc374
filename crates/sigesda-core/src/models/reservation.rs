use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::validation::reservation::MAX_OBSERVATIONS_LENGTH;

/// Lifecycle status of a reservation (matches backend enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl ReservationStatus {
    /// Rejected and cancelled reservations accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Rejected | ReservationStatus::Cancelled)
    }

    /// Whether a reservation in this status still occupies its room.
    pub fn holds_room(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, ReservationStatus::Pending)
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ReservationStatus::Pending => write!(f, "pending"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Rejected => write!(f, "rejected"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "rejected" => Ok(ReservationStatus::Rejected),
            "cancelled" | "canceled" => Ok(ReservationStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid reservation status: {}", s)),
        }
    }
}

/// A time-bounded claim on a room by a requester.
///
/// `start_time < end_time` holds for every reservation produced by this crate.
/// Reservations are never deleted; they only move through [`ReservationStatus`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: Uuid,
    pub requester_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id
    }

    pub fn as_candidate(&self) -> ReservationCandidate {
        ReservationCandidate {
            room_id: self.room_id,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// The part of a reservation that matters for conflict detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationCandidate {
    pub room_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ReservationCandidate {
    pub fn new(room_id: Uuid, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            room_id,
            start_time,
            end_time,
        }
    }
}

impl From<&CreateReservationRequest> for ReservationCandidate {
    fn from(request: &CreateReservationRequest) -> Self {
        ReservationCandidate {
            room_id: request.room_id,
            start_time: request.start_time,
            end_time: request.end_time,
        }
    }
}

/// Request DTO for creating a reservation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub room_id: Uuid,
    pub requester_id: Uuid,
    #[serde(default)]
    pub activity_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(
        max = MAX_OBSERVATIONS_LENGTH,
        message = "Observations must be at most 500 characters"
    ))]
    pub observations: Option<String>,
}

/// Payload sent to the backend when persisting a new reservation.
/// The status comes from the creation policy, never from the client request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReservation {
    pub room_id: Uuid,
    pub requester_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
}

impl NewReservation {
    pub fn from_request(request: CreateReservationRequest, status: ReservationStatus) -> Self {
        NewReservation {
            room_id: request.room_id,
            requester_id: request.requester_id,
            activity_id: request.activity_id,
            start_time: request.start_time,
            end_time: request.end_time,
            status,
            observations: request.observations,
        }
    }
}

/// Request DTO for editing a pending reservation. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReservationEdit {
    #[serde(default)]
    pub room_id: Option<Uuid>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// `null` clears the activity, an absent key leaves it unchanged
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub activity_id: Option<Option<Uuid>>,
    #[serde(default)]
    #[validate(length(
        max = MAX_OBSERVATIONS_LENGTH,
        message = "Observations must be at most 500 characters"
    ))]
    pub observations: Option<String>,
}

/// Any value present under the key, `null` included, becomes `Some`. Absent
/// keys fall back to `#[serde(default)]`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ReservationEdit {
    pub fn is_empty(&self) -> bool {
        self.room_id.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.activity_id.is_none()
            && self.observations.is_none()
    }

    /// Whether the edit moves the reservation in space or time.
    pub fn changes_slot(&self) -> bool {
        self.room_id.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }
}

/// Body of the patch-status call.
/// The reason is already normalized by the workflow (trimmed, bounded).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Date range used when listing a room's reservations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}
