//! Repository for booking records
//!
//! One row per booking whose calendar event was created. The calendar event id
//! is unique, which makes a record the durable link back to its event.

use crate::error::DbError;
use chrono::NaiveDate;

pub use bodyshop_common::models::BookingRecord;

pub trait BookingRecordRepository {
    /// Creates the `bookings` table and its date index if missing.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Stores a record. A second record for the same calendar event is rejected
    /// with [`DbError::Duplicate`].
    fn insert(
        &self,
        record: &BookingRecord,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Records whose slot starts on `date` in the business timezone, earliest first.
    fn find_by_date(
        &self,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<BookingRecord>, DbError>> + Send;

    fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<BookingRecord>, DbError>> + Send;
}
