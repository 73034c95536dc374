use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical space of the school that can be reserved (classroom, rehearsal room, hall)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub capacity: i32,
    /// Rooms marked unavailable (maintenance, retired) cannot take new reservations
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_uses_type_on_the_wire() {
        let json = serde_json::json!({
            "id": "0b8f7a6e-1c2d-4e3f-8a9b-0c1d2e3f4a5b",
            "name": "Sala Piano 2",
            "type": "rehearsal",
            "capacity": 6
        });

        let room: Room = serde_json::from_value(json).unwrap();
        assert_eq!(room.room_type, "rehearsal");
        assert!(room.available);

        let out = serde_json::to_value(&room).unwrap();
        assert_eq!(out["type"], "rehearsal");
    }
}
