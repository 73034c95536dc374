//! In-memory reservation source for testing
//!
//! Behaves like the backend for the operations the service uses, without a
//! network. Reservations and rooms are kept in maps behind mutexes.

use async_trait::async_trait;
use chrono::Utc;
use sigesda_core::conflict::reservations_in_window;
use sigesda_core::models::{
    NewReservation, Reservation, ReservationStatus, ReservationWindow, Room, StatusChange,
};
use sigesda_core::{AppError, AppResult, ReservationSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryReservationSource {
    rooms: Arc<Mutex<HashMap<Uuid, Room>>>,
    reservations: Arc<Mutex<HashMap<Uuid, Reservation>>>,
}

impl InMemoryReservationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&self, room: Room) {
        self.rooms.lock().unwrap().insert(room.id, room);
    }

    pub fn add_reservation(&self, reservation: Reservation) {
        self.reservations
            .lock()
            .unwrap()
            .insert(reservation.id, reservation);
    }

    pub fn reservation(&self, id: Uuid) -> Option<Reservation> {
        self.reservations.lock().unwrap().get(&id).cloned()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.lock().unwrap().len()
    }
}

#[async_trait]
impl ReservationSource for InMemoryReservationSource {
    async fn list_room_reservations(
        &self,
        room_id: Uuid,
        window: Option<ReservationWindow>,
    ) -> AppResult<Vec<Reservation>> {
        let all: Vec<Reservation> = self.reservations.lock().unwrap().values().cloned().collect();
        Ok(reservations_in_window(&all, room_id, window.as_ref()))
    }

    async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation> {
        self.reservation(id)
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))
    }

    async fn get_room(&self, id: Uuid) -> AppResult<Room> {
        self.rooms
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))
    }

    async fn list_active_rooms(&self) -> AppResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.available)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn set_room_availability(&self, id: Uuid, available: bool) -> AppResult<Room> {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", id)))?;
        room.available = available;
        Ok(room.clone())
    }

    async fn create_reservation(&self, new: &NewReservation) -> AppResult<Reservation> {
        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: new.room_id,
            requester_id: new.requester_id,
            activity_id: new.activity_id,
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status,
            observations: new.observations.clone(),
            cancellation_reason: None,
            rejection_reason: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.add_reservation(reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<Reservation> {
        let mut reservations = self.reservations.lock().unwrap();
        let stored = reservations
            .get_mut(&reservation.id)
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", reservation.id)))?;
        *stored = Reservation {
            updated_at: Some(Utc::now()),
            ..reservation.clone()
        };
        Ok(stored.clone())
    }

    async fn patch_status(&self, id: Uuid, change: &StatusChange) -> AppResult<Reservation> {
        let mut reservations = self.reservations.lock().unwrap();
        let stored = reservations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Reservation {} not found", id)))?;
        stored.status = change.status;
        match change.status {
            ReservationStatus::Rejected => stored.rejection_reason = change.reason.clone(),
            ReservationStatus::Cancelled => stored.cancellation_reason = change.reason.clone(),
            ReservationStatus::Pending | ReservationStatus::Confirmed => {}
        }
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }
}
