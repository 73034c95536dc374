//! Error types module
//!
//! All failures of the reservation core are unified under [`AppError`]. Every
//! variant is recoverable from the caller's point of view: the UI re-prompts
//! the user, nothing here is fatal to the process.
//!
//! [`ErrorMetadata`] lets an error describe how it should be presented, so
//! the CLI and any HTTP layer in front of the core agree on codes and messages.

use std::io;

use uuid::Uuid;

use crate::models::{Reservation, ReservationStatus};
use crate::workflow::ReservationAction;

pub type AppResult<T> = Result<T, AppError>;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like booking conflicts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code equivalent
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "RESERVATION_CONFLICT")
    fn error_code(&self) -> &'static str;

    /// Whether the caller can recover by correcting input or retrying
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from end users
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Room {room_id} is already reserved: {} overlapping reservation(s)", .conflicts.len())]
    Conflict {
        room_id: Uuid,
        conflicts: Vec<Reservation>,
    },

    #[error("Cannot {action} a reservation that is {from}")]
    InvalidTransition {
        from: ReservationStatus,
        action: ReservationAction,
    },

    #[error("Reservation cannot be edited while {status}")]
    EditNotAllowed { status: ReservationStatus },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend responded with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            true,
            Some("Check the reservation fields and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict { .. } => (
            409,
            "RESERVATION_CONFLICT",
            true,
            Some("Choose another time slot or room"),
            false,
            LogLevel::Warn,
        ),
        AppError::InvalidTransition { .. } => (
            409,
            "INVALID_TRANSITION",
            true,
            Some("Reload the reservation to see its current status"),
            false,
            LogLevel::Debug,
        ),
        AppError::EditNotAllowed { .. } => (
            422,
            "EDIT_NOT_ALLOWED",
            true,
            Some("Only pending reservations can be edited; create a new one instead"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            true,
            Some("Ask an administrator to perform this action"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            true,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Api { .. } => (
            502,
            "BACKEND_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            true,
            Some("Check the SIGESDA_* environment variables"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict { .. } => "ConflictError",
            AppError::InvalidTransition { .. } => "InvalidTransition",
            AppError::EditNotAllowed { .. } => "EditNotAllowed",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Api { .. } => "Api",
            AppError::Configuration(_) => "Configuration",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Conflicting reservations carried by a [`AppError::Conflict`], empty otherwise.
    pub fn conflicts(&self) -> &[Reservation] {
        match self {
            AppError::Conflict { conflicts, .. } => conflicts,
            _ => &[],
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg) => msg.clone(),
            AppError::Conflict { conflicts, .. } => {
                let slots: Vec<String> = conflicts
                    .iter()
                    .map(|r| {
                        format!(
                            "{}-{}",
                            r.start_time.format("%Y-%m-%d %H:%M"),
                            r.end_time.format("%H:%M")
                        )
                    })
                    .collect();
                format!("The room is already reserved at {}", slots.join(", "))
            }
            AppError::InvalidTransition { from, action } => {
                format!("A {} reservation cannot be {}", from, action.past_tense())
            }
            AppError::EditNotAllowed { status } => {
                format!("A {} reservation cannot be edited", status)
            }
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Api { .. } => "The reservation service is unavailable".to_string(),
            AppError::Configuration(_) => "Client is misconfigured".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }
}
