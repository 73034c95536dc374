//! SIGESDA Services Layer
//!
//! This crate is the **reservation service layer**: it orchestrates the rules
//! from sigesda-core against a [`sigesda_core::ReservationSource`]. Every
//! operation fetches a fresh snapshot of the room before deciding, so callers
//! never evaluate conflicts against stale data.

pub mod services;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use services::ReservationService;
