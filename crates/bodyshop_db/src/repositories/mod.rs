//! Repository modules for database access

pub mod booking_record;
pub mod booking_record_sql;

pub use booking_record::{BookingRecord, BookingRecordRepository};
pub use booking_record_sql::SqlBookingRecordRepository;
