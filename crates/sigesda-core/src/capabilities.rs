//! Role-based capability checks.
//!
//! Each [`Role`] maps to a fixed [`CapabilitySet`]. Whether an actor may run a
//! workflow action on a given reservation combines three things: the action is
//! legal for the reservation's status, the role has the capability, and for
//! "own" capabilities the actor is the requester.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};
use crate::models::{Actor, Reservation, Role};
use crate::workflow::{next_allowed_actions, ReservationAction};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateReservation,
    EditOwnReservation,
    EditAnyReservation,
    ApproveReservation,
    RejectReservation,
    CancelOwnReservation,
    CancelAnyReservation,
    ManageRooms,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        CapabilitySet(iter.into_iter().collect())
    }
}

pub fn capabilities_for(role: Role) -> CapabilitySet {
    use Capability::*;

    match role {
        Role::Administrator => [
            CreateReservation,
            EditOwnReservation,
            EditAnyReservation,
            ApproveReservation,
            RejectReservation,
            CancelOwnReservation,
            CancelAnyReservation,
            ManageRooms,
        ]
        .into_iter()
        .collect(),
        Role::Secretary => [
            CreateReservation,
            EditOwnReservation,
            EditAnyReservation,
            ApproveReservation,
            RejectReservation,
            CancelOwnReservation,
            CancelAnyReservation,
        ]
        .into_iter()
        .collect(),
        Role::Teacher => [CreateReservation, EditOwnReservation, CancelOwnReservation]
            .into_iter()
            .collect(),
        Role::Student => CapabilitySet::default(),
    }
}

pub fn can_create(actor: &Actor) -> bool {
    capabilities_for(actor.role).contains(Capability::CreateReservation)
}

/// Whether `actor` may run `action` on `reservation`, ignoring its status.
pub fn can_perform(actor: &Actor, reservation: &Reservation, action: ReservationAction) -> bool {
    let caps = capabilities_for(actor.role);
    match action {
        ReservationAction::Approve => caps.contains(Capability::ApproveReservation),
        ReservationAction::Reject => caps.contains(Capability::RejectReservation),
        ReservationAction::Cancel => {
            caps.contains(Capability::CancelAnyReservation)
                || (caps.contains(Capability::CancelOwnReservation)
                    && reservation.is_owned_by(actor.user_id))
        }
    }
}

pub fn can_edit(actor: &Actor, reservation: &Reservation) -> bool {
    let caps = capabilities_for(actor.role);
    caps.contains(Capability::EditAnyReservation)
        || (caps.contains(Capability::EditOwnReservation) && reservation.is_owned_by(actor.user_id))
}

/// Workflow actions `actor` can run on `reservation` right now.
pub fn allowed_actions_for(reservation: &Reservation, actor: &Actor) -> Vec<ReservationAction> {
    next_allowed_actions(reservation.status)
        .into_iter()
        .filter(|action| can_perform(actor, reservation, *action))
        .collect()
}

pub fn ensure_can_create(actor: &Actor) -> AppResult<()> {
    if !can_create(actor) {
        return Err(AppError::Forbidden(format!(
            "Role {} cannot create reservations",
            actor.role
        )));
    }
    Ok(())
}

pub fn ensure_can_perform(
    actor: &Actor,
    reservation: &Reservation,
    action: ReservationAction,
) -> AppResult<()> {
    if !can_perform(actor, reservation, action) {
        return Err(AppError::Forbidden(format!(
            "Role {} cannot {} this reservation",
            actor.role, action
        )));
    }
    Ok(())
}

pub fn ensure_can_edit(actor: &Actor, reservation: &Reservation) -> AppResult<()> {
    if !can_edit(actor, reservation) {
        return Err(AppError::Forbidden(format!(
            "Role {} cannot edit this reservation",
            actor.role
        )));
    }
    Ok(())
}

/// Opening or closing rooms for reservations
pub fn ensure_can_manage_rooms(actor: &Actor) -> AppResult<()> {
    if !capabilities_for(actor.role).contains(Capability::ManageRooms) {
        return Err(AppError::Forbidden(format!(
            "Role {} cannot manage rooms",
            actor.role
        )));
    }
    Ok(())
}
