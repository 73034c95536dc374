//! Reservation workflow state machine.
//!
//! Pure functions computing the next status of a reservation from its current
//! status and the requested action:
//!
//! ```text
//! Pending   --approve--> Confirmed
//! Pending   --reject---> Rejected    (reason required)
//! Pending   --cancel---> Cancelled   (withdrawal, reason optional)
//! Confirmed --cancel---> Cancelled   (reason required)
//! ```
//!
//! Rejected and Cancelled are terminal. Edits are only accepted while Pending.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::{Reservation, ReservationEdit, ReservationStatus};
use crate::validation::{normalize_reason, validate_required_id, validate_time_range, ReservationRules};

/// Workflow action that moves a reservation to another status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReservationAction {
    Approve,
    Reject,
    Cancel,
}

impl ReservationAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            ReservationAction::Approve => "approved",
            ReservationAction::Reject => "rejected",
            ReservationAction::Cancel => "cancelled",
        }
    }

    /// Whether performing this action from `from` needs a reason.
    /// Withdrawing a pending reservation is the only cancellation without one.
    pub fn requires_reason(&self, from: ReservationStatus) -> bool {
        match self {
            ReservationAction::Approve => false,
            ReservationAction::Reject => true,
            ReservationAction::Cancel => from == ReservationStatus::Confirmed,
        }
    }
}

impl Display for ReservationAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ReservationAction::Approve => write!(f, "approve"),
            ReservationAction::Reject => write!(f, "reject"),
            ReservationAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl FromStr for ReservationAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" | "confirm" => Ok(ReservationAction::Approve),
            "reject" => Ok(ReservationAction::Reject),
            "cancel" | "withdraw" => Ok(ReservationAction::Cancel),
            _ => Err(anyhow::anyhow!("Invalid reservation action: {}", s)),
        }
    }
}

/// Actions that are legal from `status`, in a stable order.
pub fn next_allowed_actions(status: ReservationStatus) -> Vec<ReservationAction> {
    match status {
        ReservationStatus::Pending => vec![
            ReservationAction::Approve,
            ReservationAction::Reject,
            ReservationAction::Cancel,
        ],
        ReservationStatus::Confirmed => vec![ReservationAction::Cancel],
        ReservationStatus::Rejected | ReservationStatus::Cancelled => Vec::new(),
    }
}

/// Compute the status reached by applying `action` to `from`.
pub fn transition(
    from: ReservationStatus,
    action: ReservationAction,
) -> AppResult<ReservationStatus> {
    match (from, action) {
        (ReservationStatus::Pending, ReservationAction::Approve) => Ok(ReservationStatus::Confirmed),
        (ReservationStatus::Pending, ReservationAction::Reject) => Ok(ReservationStatus::Rejected),
        (ReservationStatus::Pending, ReservationAction::Cancel)
        | (ReservationStatus::Confirmed, ReservationAction::Cancel) => {
            Ok(ReservationStatus::Cancelled)
        }
        (from, action) => Err(AppError::InvalidTransition { from, action }),
    }
}

/// Apply a workflow action, returning the updated reservation.
///
/// The transition is checked before the reason so that a terminal reservation
/// always reports [`AppError::InvalidTransition`].
pub fn apply_action(
    reservation: &Reservation,
    action: ReservationAction,
    reason: Option<&str>,
) -> AppResult<Reservation> {
    let next = transition(reservation.status, action)?;
    let reason = normalize_reason(reason, action.requires_reason(reservation.status))?;

    let mut updated = reservation.clone();
    updated.status = next;
    match action {
        ReservationAction::Approve => {}
        ReservationAction::Reject => updated.rejection_reason = reason,
        ReservationAction::Cancel => updated.cancellation_reason = reason,
    }

    Ok(updated)
}

/// Apply an edit to a pending reservation, returning the updated reservation.
///
/// Non-pending reservations fail with [`AppError::EditNotAllowed`]. The
/// resulting interval is revalidated; conflicts are the caller's concern.
pub fn apply_edit(
    reservation: &Reservation,
    edit: &ReservationEdit,
    rules: &ReservationRules,
) -> AppResult<Reservation> {
    if !reservation.status.is_editable() {
        return Err(AppError::EditNotAllowed {
            status: reservation.status,
        });
    }

    validator::Validate::validate(edit)?;

    let mut updated = reservation.clone();
    if let Some(room_id) = edit.room_id {
        validate_required_id("room_id", room_id)?;
        updated.room_id = room_id;
    }
    if let Some(start) = edit.start_time {
        updated.start_time = start;
    }
    if let Some(end) = edit.end_time {
        updated.end_time = end;
    }
    if let Some(activity_id) = edit.activity_id {
        updated.activity_id = activity_id;
    }
    if let Some(ref observations) = edit.observations {
        let trimmed = observations.trim();
        updated.observations = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    validate_time_range(updated.start_time, updated.end_time, rules)?;

    Ok(updated)
}
