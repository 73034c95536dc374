//! Trait interface to wherever reservations live
//!
//! The core never talks to the backend directly. The HTTP client implements
//! [`ReservationSource`]; tests use an in-memory implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewReservation, Reservation, ReservationWindow, Room, StatusChange};

#[async_trait]
pub trait ReservationSource: Send + Sync {
    /// Reservations of a room, optionally restricted to those intersecting `window`.
    /// Every status is returned; callers filter.
    async fn list_room_reservations(
        &self,
        room_id: Uuid,
        window: Option<ReservationWindow>,
    ) -> AppResult<Vec<Reservation>>;

    /// Fails with `AppError::NotFound` for unknown ids
    async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation>;

    /// Fails with `AppError::NotFound` for unknown ids
    async fn get_room(&self, id: Uuid) -> AppResult<Room>;

    async fn list_active_rooms(&self) -> AppResult<Vec<Room>>;

    /// Open or close a room for new reservations
    async fn set_room_availability(&self, id: Uuid, available: bool) -> AppResult<Room>;

    async fn create_reservation(&self, reservation: &NewReservation) -> AppResult<Reservation>;

    /// Persist edited fields of an existing reservation
    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<Reservation>;

    async fn patch_status(&self, id: Uuid, change: &StatusChange) -> AppResult<Reservation>;
}
