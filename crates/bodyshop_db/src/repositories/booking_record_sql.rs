//! SQL implementation of the booking record repository

use crate::error::DbError;
use crate::repositories::booking_record::{BookingRecord, BookingRecordRepository};
use crate::DbClient;
use bodyshop_common::services::{BookingStore, BoxFuture, BoxedError};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

const SELECT_COLUMNS: &str = "id, calendar_event_id, html_link, start_time, end_time, \
    customer_name, customer_phone, customer_email, car_make, car_model, service_type, notes, \
    created_at";

#[derive(Debug, Clone)]
pub struct SqlBookingRecordRepository {
    db_client: DbClient,
}

impl SqlBookingRecordRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

/// Business-local day of an RFC 3339 start time.
fn booking_date(start_time: &str) -> Result<NaiveDate, DbError> {
    DateTime::parse_from_rfc3339(start_time)
        .map(|start| start.date_naive())
        .map_err(|e| DbError::QueryError(format!("invalid start_time '{}': {}", start_time, e)))
}

fn record_from_row(row: &AnyRow) -> Result<BookingRecord, DbError> {
    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| DbError::DecodeError(format!("created_at '{}': {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(BookingRecord {
        id: row.try_get("id")?,
        calendar_event_id: row.try_get("calendar_event_id")?,
        html_link: row.try_get("html_link")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        customer_name: row.try_get("customer_name")?,
        customer_phone: row.try_get("customer_phone")?,
        customer_email: row.try_get("customer_email")?,
        car_make: row.try_get("car_make")?,
        car_model: row.try_get("car_model")?,
        service_type: row.try_get("service_type")?,
        notes: row.try_get("notes")?,
        created_at,
    })
}

impl BookingRecordRepository for SqlBookingRecordRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                calendar_event_id TEXT NOT NULL UNIQUE,
                html_link TEXT,
                booking_date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                customer_name TEXT NOT NULL,
                customer_phone TEXT NOT NULL,
                customer_email TEXT NOT NULL,
                car_make TEXT NOT NULL,
                car_model TEXT NOT NULL,
                service_type TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings (booking_date)")
            .await?;

        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn insert(&self, record: &BookingRecord) -> Result<(), DbError> {
        let date = booking_date(&record.start_time)?;
        debug!(event_id = %record.calendar_event_id, %date, "Inserting booking record");

        let query = r#"
            INSERT INTO bookings (
                id, calendar_event_id, html_link, booking_date, start_time, end_time,
                customer_name, customer_phone, customer_email, car_make, car_model,
                service_type, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#;

        sqlx::query(query)
            .bind(&record.id)
            .bind(&record.calendar_event_id)
            .bind(record.html_link.clone())
            .bind(date.format("%Y-%m-%d").to_string())
            .bind(&record.start_time)
            .bind(&record.end_time)
            .bind(&record.customer_name)
            .bind(&record.customer_phone)
            .bind(&record.customer_email)
            .bind(&record.car_make)
            .bind(&record.car_model)
            .bind(&record.service_type)
            .bind(record.notes.clone())
            .bind(record.created_at.to_rfc3339())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    DbError::Duplicate(record.calendar_event_id.clone())
                }
                other => {
                    error!("Failed to insert booking record: {}", other);
                    DbError::QueryError(other.to_string())
                }
            })?;

        info!(event_id = %record.calendar_event_id, booking_id = %record.id, "Booking record stored");
        Ok(())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<BookingRecord>, DbError> {
        let query = format!(
            "SELECT {} FROM bookings WHERE booking_date = $1 ORDER BY start_time",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find booking records: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(record_from_row).collect()
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<BookingRecord>, DbError> {
        let query = format!(
            "SELECT {} FROM bookings WHERE calendar_event_id = $1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(event_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.as_ref().map(record_from_row).transpose()
    }
}

impl BookingStore for SqlBookingRecordRepository {
    fn insert_booking(&self, record: BookingRecord) -> BoxFuture<'_, (), BoxedError> {
        Box::pin(async move {
            BookingRecordRepository::insert(self, &record)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn find_by_date(&self, date: NaiveDate) -> BoxFuture<'_, Vec<BookingRecord>, BoxedError> {
        Box::pin(async move {
            BookingRecordRepository::find_by_date(self, date)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}
