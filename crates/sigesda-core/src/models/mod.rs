//! Data models for the reservation core
//!
//! Rooms, reservations with their lifecycle status, and the actor performing
//! an operation. Request DTOs live next to the entity they modify.

mod reservation;
mod room;
mod user;

// Re-export all models for convenient imports
pub use reservation::*;
pub use room::*;
pub use user::*;
