//! Validation modules

pub mod reservation;

pub use reservation::{
    ensure_room_available, normalize_reason, validate_create_request, validate_required_id,
    validate_time_range, ReservationRules, DEFAULT_MAX_DURATION_HOURS, MAX_OBSERVATIONS_LENGTH,
    MAX_REASON_LENGTH,
};
