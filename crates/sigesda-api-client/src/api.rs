//! Reservation and room endpoints of the SIGESDA API.
//!
//! [`ApiClient`] implements [`ReservationSource`] over these endpoints, so the
//! reservation service can run against the real backend.

use crate::ApiClient;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sigesda_core::models::{
    NewReservation, Reservation, ReservationWindow, Room, StatusChange,
};
use sigesda_core::{AppResult, ReservationSource};
use uuid::Uuid;

/// Body of `PUT /reservations/{id}`: the fields an edit may change.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationUpdate {
    pub room_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub observations: Option<String>,
}

impl From<&Reservation> for ReservationUpdate {
    fn from(reservation: &Reservation) -> Self {
        Self {
            room_id: reservation.room_id,
            activity_id: reservation.activity_id,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            observations: reservation.observations.clone(),
        }
    }
}

/// Body of `PATCH /rooms/{id}`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomAvailability {
    pub available: bool,
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl ApiClient {
    pub async fn list_reservations(
        &self,
        room_id: Uuid,
        window: Option<ReservationWindow>,
    ) -> AppResult<Vec<Reservation>> {
        let mut query = vec![("room_id", room_id.to_string())];
        if let Some(w) = window {
            query.push(("from", timestamp(w.from)));
            query.push(("to", timestamp(w.to)));
        }
        self.get("/reservations", &query).await
    }

    pub async fn get_reservation_by_id(&self, id: Uuid) -> AppResult<Reservation> {
        self.get(&format!("/reservations/{}", id), &[]).await
    }

    pub async fn get_room_by_id(&self, id: Uuid) -> AppResult<Room> {
        self.get(&format!("/rooms/{}", id), &[]).await
    }

    /// Rooms flagged as available, sorted by name
    pub async fn list_rooms(&self) -> AppResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .get("/rooms", &[("active", "true".to_string())])
            .await?;
        rooms.retain(|r| r.available);
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }
}

#[async_trait]
impl ReservationSource for ApiClient {
    async fn list_room_reservations(
        &self,
        room_id: Uuid,
        window: Option<ReservationWindow>,
    ) -> AppResult<Vec<Reservation>> {
        self.list_reservations(room_id, window).await
    }

    async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation> {
        self.get_reservation_by_id(id).await
    }

    async fn get_room(&self, id: Uuid) -> AppResult<Room> {
        self.get_room_by_id(id).await
    }

    async fn list_active_rooms(&self) -> AppResult<Vec<Room>> {
        self.list_rooms().await
    }

    async fn set_room_availability(&self, id: Uuid, available: bool) -> AppResult<Room> {
        self.patch_json(&format!("/rooms/{}", id), &RoomAvailability { available })
            .await
    }

    async fn create_reservation(&self, reservation: &NewReservation) -> AppResult<Reservation> {
        self.post_json("/reservations", reservation).await
    }

    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<Reservation> {
        self.put_json(
            &format!("/reservations/{}", reservation.id),
            &ReservationUpdate::from(reservation),
        )
        .await
    }

    async fn patch_status(&self, id: Uuid, change: &StatusChange) -> AppResult<Reservation> {
        self.patch_json(&format!("/reservations/{}/status", id), change)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use chrono::TimeZone;
    use mockito::Matcher;
    use serde_json::json;
    use sigesda_core::models::ReservationStatus;
    use sigesda_core::AppError;
    use std::time::Duration;

    fn client(server: &mockito::Server) -> ApiClient {
        ApiClient::new(
            server.url(),
            "v1",
            Auth::Bearer("token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    fn reservation_json(id: Uuid, room_id: Uuid, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "room_id": room_id,
            "requester_id": Uuid::nil(),
            "start_time": "2026-03-02T10:00:00Z",
            "end_time": "2026-03-02T12:00:00Z",
            "status": status,
        })
    }

    #[tokio::test]
    async fn lists_room_reservations_in_window() {
        let mut server = mockito::Server::new_async().await;
        let room_id = Uuid::new_v4();
        let id = Uuid::new_v4();
        let mock = server
            .mock("GET", "/api/v1/reservations")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("room_id".into(), room_id.to_string()),
                Matcher::UrlEncoded("from".into(), "2026-03-02T09:00:00Z".into()),
                Matcher::UrlEncoded("to".into(), "2026-03-02T13:00:00Z".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([reservation_json(id, room_id, "confirmed")]).to_string())
            .create_async()
            .await;

        let api = client(&server);
        let window = ReservationWindow {
            from: at(9),
            to: at(13),
        };
        let reservations = api
            .list_room_reservations(room_id, Some(window))
            .await
            .unwrap();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].id, id);
        assert_eq!(reservations[0].status, ReservationStatus::Confirmed);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn active_rooms_drop_unavailable_and_sort() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/rooms")
            .match_query(Matcher::UrlEncoded("active".into(), "true".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"id": Uuid::new_v4(), "name": "Sala B", "type": "classroom", "capacity": 10},
                    {"id": Uuid::new_v4(), "name": "Auditorio", "type": "hall", "capacity": 200},
                    {"id": Uuid::new_v4(), "name": "Sala A", "type": "classroom", "capacity": 10, "available": false},
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let rooms = client(&server).list_active_rooms().await.unwrap();
        let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Auditorio", "Sala B"]);
    }

    #[tokio::test]
    async fn patch_status_sends_reason() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let room_id = Uuid::new_v4();
        let mock = server
            .mock("PATCH", format!("/api/v1/reservations/{}/status", id).as_str())
            .match_header("authorization", "Bearer token")
            .match_body(Matcher::Json(json!({"status": "rejected", "reason": "Exams"})))
            .with_status(200)
            .with_body(reservation_json(id, room_id, "rejected").to_string())
            .create_async()
            .await;

        let change = StatusChange {
            status: ReservationStatus::Rejected,
            reason: Some("Exams".to_string()),
        };
        let updated = client(&server).patch_status(id, &change).await.unwrap();
        assert_eq!(updated.status, ReservationStatus::Rejected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn closing_a_room_patches_availability() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock("PATCH", format!("/api/v1/rooms/{}", id).as_str())
            .match_body(Matcher::Json(json!({"available": false})))
            .with_status(200)
            .with_body(
                json!({"id": id, "name": "Sala 1", "type": "classroom", "capacity": 20, "available": false})
                    .to_string(),
            )
            .create_async()
            .await;

        let room = client(&server).set_room_availability(id, false).await.unwrap();
        assert!(!room.available);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_reservation_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();
        server
            .mock("GET", format!("/api/v1/reservations/{}", id).as_str())
            .with_status(404)
            .create_async()
            .await;

        let err = client(&server).get_reservation(id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn update_body_carries_editable_fields_only() {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            activity_id: None,
            start_time: at(10),
            end_time: at(11),
            status: ReservationStatus::Pending,
            observations: Some("Choir".to_string()),
            cancellation_reason: None,
            rejection_reason: None,
            created_at: None,
            updated_at: None,
        };
        let body = serde_json::to_value(ReservationUpdate::from(&reservation)).unwrap();
        assert!(body.get("status").is_none());
        assert_eq!(body["observations"], "Choir");
    }
}
