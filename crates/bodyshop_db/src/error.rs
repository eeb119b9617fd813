//! Error types for the database client

use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database configuration error: {0}")]
    ConfigError(String),

    #[error("Database pool error: {0}")]
    PoolError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    /// A booking for this calendar event is already stored.
    #[error("Booking for calendar event {0} already exists")]
    Duplicate(String),

    /// A stored row could not be turned back into a booking record.
    #[error("Corrupt booking row: {0}")]
    DecodeError(String),
}
