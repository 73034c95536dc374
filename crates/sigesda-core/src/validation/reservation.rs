//! Reservation validation module
//!
//! Provides validation for reservation input before any conflict check runs:
//! - Required identifiers (room, requester) must be present
//! - Time range: start strictly before end, bounded duration
//! - Free-text fields (observations, reasons): trimmed, bounded length
//! - Target room must be available

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{CreateReservationRequest, Room};

/// Maximum length for observations on a reservation (500 characters)
pub const MAX_OBSERVATIONS_LENGTH: u64 = 500;

/// Maximum length for rejection and cancellation reasons (500 characters)
pub const MAX_REASON_LENGTH: u64 = 500;

/// Default upper bound on a single reservation (12 hours)
pub const DEFAULT_MAX_DURATION_HOURS: i64 = 12;

/// Limits applied to every reservation interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationRules {
    pub max_duration: Duration,
}

impl Default for ReservationRules {
    fn default() -> Self {
        Self {
            max_duration: Duration::hours(DEFAULT_MAX_DURATION_HOURS),
        }
    }
}

impl ReservationRules {
    /// Rules with the given bound, or `None` when `hours` does not fit a [`Duration`].
    pub fn try_with_max_duration_hours(hours: i64) -> Option<Self> {
        Duration::try_hours(hours).map(|max_duration| Self { max_duration })
    }

    /// Like [`Self::try_with_max_duration_hours`], saturating out-of-range values.
    pub fn with_max_duration_hours(hours: i64) -> Self {
        Self::try_with_max_duration_hours(hours).unwrap_or(Self {
            max_duration: if hours < 0 { Duration::MIN } else { Duration::MAX },
        })
    }
}

/// Validate that an identifier was actually provided
///
/// The backend uses the nil UUID as "not selected" in empty forms.
pub fn validate_required_id(field: &str, id: Uuid) -> AppResult<()> {
    if id.is_nil() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Validate a reservation interval
///
/// Rules:
/// - `start < end` (half-open interval must not be empty)
/// - `end - start <= rules.max_duration`
pub fn validate_time_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    rules: &ReservationRules,
) -> AppResult<()> {
    if start >= end {
        return Err(AppError::Validation(format!(
            "Start time {} must be before end time {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }

    if end - start > rules.max_duration {
        return Err(AppError::Validation(format!(
            "Reservation lasts {} minutes, maximum is {} minutes",
            (end - start).num_minutes(),
            rules.max_duration.num_minutes()
        )));
    }

    Ok(())
}

/// Validate a create request: field constraints, required ids and interval
pub fn validate_create_request(
    request: &CreateReservationRequest,
    rules: &ReservationRules,
) -> AppResult<()> {
    request.validate()?;
    validate_required_id("room_id", request.room_id)?;
    validate_required_id("requester_id", request.requester_id)?;
    validate_time_range(request.start_time, request.end_time, rules)
}

/// Ensure the target room can take new reservations
pub fn ensure_room_available(room: &Room) -> AppResult<()> {
    if !room.available {
        return Err(AppError::Validation(format!(
            "Room '{}' is not available for reservations",
            room.name
        )));
    }
    Ok(())
}

/// Normalize a free-text reason
///
/// Blank reasons count as missing. Returns `Ok(None)` when no reason was given
/// and none is required.
pub fn normalize_reason(reason: Option<&str>, required: bool) -> AppResult<Option<String>> {
    let trimmed = reason.map(str::trim).filter(|r| !r.is_empty());

    match trimmed {
        None if required => Err(AppError::Validation("A reason is required".to_string())),
        None => Ok(None),
        Some(r) if r.chars().count() as u64 > MAX_REASON_LENGTH => Err(AppError::Validation(
            format!("Reason must be at most {} characters", MAX_REASON_LENGTH),
        )),
        Some(r) => Ok(Some(r.to_string())),
    }
}
