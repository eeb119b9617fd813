// --- File: crates/bodyshop_common/src/error.rs ---
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// The error taxonomy shared by every booking operation.
///
/// Each variant maps to exactly one HTTP status through [`HttpStatusCode`].
/// Conversation problems are never errors; the chat flow answers with a re-prompt instead.
#[derive(Error, Debug)]
pub enum BodyshopError {
    /// Malformed or incomplete booking input. Raised before any external call.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The calendar credentials were rejected even after one refresh.
    #[error("Calendar credentials expired, please retry later: {0}")]
    CredentialExpired(String),

    /// The requested slot overlaps an existing calendar event.
    #[error("Time slot is no longer available: {0}")]
    SlotConflict(String),

    /// Reading the calendar failed.
    #[error("Calendar unavailable: {0}")]
    CalendarUnavailable(String),

    /// Inserting the calendar event failed.
    #[error("Failed to create calendar event: {0}")]
    CalendarWriteError(String),

    /// The calendar event exists but the booking record could not be stored.
    #[error("Booking record not saved for calendar event {event_id}: {message}")]
    PersistenceError { event_id: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BodyshopError {
    fn status_code(&self) -> u16 {
        match self {
            BodyshopError::ValidationError(_) => 400,
            BodyshopError::CredentialExpired(_) => 401,
            BodyshopError::SlotConflict(_) => 409,
            BodyshopError::CalendarUnavailable(_) => 500,
            BodyshopError::CalendarWriteError(_) => 500,
            BodyshopError::PersistenceError { .. } => 500,
            BodyshopError::ConfigError(_) => 500,
            BodyshopError::InternalError(_) => 500,
        }
    }
}

impl BodyshopError {
    /// Machine-readable extras for the error body, if the variant carries any.
    pub fn details(&self) -> Option<Value> {
        match self {
            BodyshopError::PersistenceError { event_id, .. } => {
                Some(json!({ "calendarEventId": event_id }))
            }
            BodyshopError::CredentialExpired(_) => Some(json!({ "retry": true })),
            _ => None,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error, turning it into an [`BodyshopError::InternalError`].
    fn context<C>(self, context: C) -> Result<T, BodyshopError>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, BodyshopError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| BodyshopError::InternalError(format!("{}: {}", context, error)))
    }
}

impl From<serde_json::Error> for BodyshopError {
    fn from(err: serde_json::Error) -> Self {
        BodyshopError::InternalError(err.to_string())
    }
}

pub fn validation_error<T: fmt::Display>(message: T) -> BodyshopError {
    BodyshopError::ValidationError(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> BodyshopError {
    BodyshopError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> BodyshopError {
    BodyshopError::InternalError(message.to_string())
}
