//! SIGESDA Reservation Core
//!
//! This crate provides the room-reservation rules of the SIGESDA music-school
//! system: domain models, conflict detection, the reservation workflow state
//! machine, role capabilities, configuration and error types. Everything here
//! is synchronous and free of I/O except the [`ReservationSource`] trait, which
//! other crates implement.

pub mod capabilities;
pub mod config;
pub mod conflict;
pub mod error;
pub mod models;
pub mod policy;
pub mod source;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use capabilities::{allowed_actions_for, capabilities_for, Capability, CapabilitySet};
pub use config::{Config, ReservationConfig};
pub use conflict::{detect_conflicts, ensure_no_conflicts, intervals_overlap};
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use policy::CreationPolicy;
pub use source::ReservationSource;
pub use validation::ReservationRules;
pub use workflow::{apply_action, apply_edit, next_allowed_actions, transition, ReservationAction};
