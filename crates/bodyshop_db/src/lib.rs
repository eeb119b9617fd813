//! Booking record persistence
//!
//! A database client over SQLx's `Any` driver (SQLite by default, PostgreSQL
//! behind the `postgres` feature) and the repository that stores one record per
//! created calendar event. The repository also implements the
//! [`bodyshop_common::services::BookingStore`] trait used by the booking writer.
//!
//! ```rust,no_run
//! use bodyshop_db::{BookingRecordRepository, DbClient, SqlBookingRecordRepository};
//!
//! async fn setup() -> Result<SqlBookingRecordRepository, bodyshop_db::DbError> {
//!     let client = DbClient::from_url("sqlite://data/bookings.db").await?;
//!     let repository = SqlBookingRecordRepository::new(client);
//!     repository.init_schema().await?;
//!     Ok(repository)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::{BookingRecordRepository, SqlBookingRecordRepository};
