// --- File: crates/bodyshop_common/src/services.rs ---
//! Service abstractions for the booking core.
//!
//! The availability resolver, the booking writer and the chat assistant only
//! see these traits, so tests can swap Google Calendar and the database for
//! in-memory fakes.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::error::BodyshopError;
use crate::models::{BookingRecord, BookingRequest, TimeSlot};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Errors surfaced by a calendar backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarServiceError {
    /// The access token was rejected or the refresh token is no longer valid.
    #[error("Credentials expired: {0}")]
    CredentialExpired(String),

    #[error("Calendar API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Calendar request failed: {0}")]
    Transport(String),

    #[error("Unexpected calendar response: {0}")]
    InvalidResponse(String),
}

impl CalendarServiceError {
    pub fn is_credential_expired(&self) -> bool {
        matches!(self, CalendarServiceError::CredentialExpired(_))
    }
}

/// An existing calendar event, reduced to what slot checks need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub summary: Option<String>,
    /// `None` for all-day events, which carry a date instead of a dateTime.
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

/// A calendar event to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA zone sent alongside the timestamps.
    pub time_zone: String,
}

/// Identity of an event the calendar accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

/// A trait for calendar service operations.
pub trait CalendarService: Send + Sync {
    /// Events overlapping `[time_min, time_max)`, expanded to single instances
    /// and ordered by start time. An event that began before `time_min` but ends
    /// after it is included.
    fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        time_zone: &str,
    ) -> BoxFuture<'_, Vec<CalendarEntry>, CalendarServiceError>;

    fn create_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CreatedEvent, CalendarServiceError>;

    /// Exchanges the stored refresh token for a fresh access token.
    fn refresh_credentials(&self) -> BoxFuture<'_, (), CalendarServiceError>;
}

/// Durable storage of booking records.
pub trait BookingStore: Send + Sync {
    fn insert_booking(&self, record: BookingRecord) -> BoxFuture<'_, (), BoxedError>;

    /// Records whose slot starts on `date` (business-local), ordered by start time.
    fn find_by_date(&self, date: NaiveDate) -> BoxFuture<'_, Vec<BookingRecord>, BoxedError>;
}

/// Creates bookings end to end: validation, conflict check, calendar event, record.
pub trait BookingService: Send + Sync {
    fn create_booking(&self, request: BookingRequest)
        -> BoxFuture<'_, BookingRecord, BodyshopError>;
}

/// Live slot availability for a business day.
pub trait SlotAvailability: Send + Sync {
    fn available_slots(&self, date: NaiveDate) -> BoxFuture<'_, Vec<TimeSlot>, BodyshopError>;
}
