// Shared fixtures for the in-crate tests.
use bodyshop_common::models::{BookingRecord, BookingRequest};
use bodyshop_common::services::{BookingStore, BoxFuture, BoxedError};
use bodyshop_config::{AppConfig, BusinessConfig, LoggingConfig, ServerConfig};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockBookingStore {
    pub records: Mutex<Vec<BookingRecord>>,
    pub insert_calls: AtomicUsize,
    pub fail_inserts: AtomicBool,
}

impl MockBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_inserts.store(true, Ordering::SeqCst);
        store
    }
}

impl BookingStore for MockBookingStore {
    fn insert_booking(&self, record: BookingRecord) -> BoxFuture<'_, (), BoxedError> {
        Box::pin(async move {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(BoxedError("database is locked".into()));
            }
            self.records.lock().unwrap().push(record);
            Ok(())
        })
    }

    fn find_by_date(&self, date: NaiveDate) -> BoxFuture<'_, Vec<BookingRecord>, BoxedError> {
        Box::pin(async move {
            let prefix = date.format("%Y-%m-%d").to_string();
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.start_time.starts_with(&prefix))
                .cloned()
                .collect())
        })
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        use_gcal: true,
        use_database: false,
        use_chat: false,
        business: BusinessConfig::default(),
        logging: LoggingConfig::default(),
        database: None,
        gcal: None,
    }
}

/// A complete request for 2:00 PM EDT on Monday 2099-06-01.
pub fn sample_request() -> BookingRequest {
    BookingRequest {
        start_time: "2099-06-01T14:00:00-04:00".to_string(),
        end_time: "2099-06-01T15:00:00-04:00".to_string(),
        customer_name: "Dana Smith".to_string(),
        customer_phone: "555-123-4567".to_string(),
        customer_email: "dana@example.com".to_string(),
        car_make: "Honda".to_string(),
        car_model: "Civic".to_string(),
        service_type: "Dent Repair".to_string(),
        notes: Some("Dent on the rear door".to_string()),
    }
}
