// --- File: crates/bodyshop_gcal/src/booking.rs ---
use bodyshop_common::error::BodyshopError;
use bodyshop_common::models::{normalized_phone, BookingRecord, BookingRequest};
use bodyshop_common::services::{
    BookingService, BookingStore, BoxFuture, CalendarEntry, CalendarService, NewCalendarEvent,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::logic::{read_error, with_credential_retry, CLOSE_HOUR, OPEN_HOUR};

/// A request that passed validation: trimmed fields, normalized phone, parsed slot.
/// Start and end are rewritten in the business offset.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub request: BookingRequest,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Business-local day of the slot.
    pub date: NaiveDate,
}

/// Checks every field, the slot alignment and that the slot has not started
/// before `now`. Performs no I/O.
pub fn validate_booking(
    request: &BookingRequest,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<ValidatedBooking, BodyshopError> {
    let missing: Vec<&str> = request
        .required_fields()
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(BodyshopError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let start = parse_timestamp("startTime", &request.start_time)?;
    let end = parse_timestamp("endTime", &request.end_time)?;

    let local_start = start.with_timezone(&tz);
    let on_the_hour =
        local_start.minute() == 0 && local_start.second() == 0 && local_start.nanosecond() == 0;
    if !on_the_hour || !(OPEN_HOUR..CLOSE_HOUR).contains(&local_start.hour()) {
        return Err(BodyshopError::ValidationError(format!(
            "startTime {} is not a bookable slot (on the hour, 9:00 AM to 4:00 PM)",
            request.start_time
        )));
    }
    if start.with_timezone(&Utc) < now {
        return Err(BodyshopError::ValidationError(format!(
            "startTime {} has already passed",
            request.start_time
        )));
    }
    if end - start != Duration::hours(1) {
        return Err(BodyshopError::ValidationError(
            "endTime must be exactly one hour after startTime".to_string(),
        ));
    }

    let customer_phone = normalized_phone(&request.customer_phone).ok_or_else(|| {
        BodyshopError::ValidationError(format!(
            "customerPhone '{}' is not a 10-digit US phone number",
            request.customer_phone.trim()
        ))
    })?;

    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(ValidatedBooking {
        request: BookingRequest {
            start_time: local_start.to_rfc3339(),
            end_time: end.with_timezone(&tz).to_rfc3339(),
            customer_name: request.customer_name.trim().to_string(),
            customer_phone,
            customer_email: request.customer_email.trim().to_string(),
            car_make: request.car_make.trim().to_string(),
            car_model: request.car_model.trim().to_string(),
            service_type: request.service_type.trim().to_string(),
            notes,
        },
        start,
        end,
        date: local_start.date_naive(),
    })
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<FixedOffset>, BodyshopError> {
    DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| {
        BodyshopError::ValidationError(format!("{} must be an RFC 3339 timestamp", field))
    })
}

/// True when a timed event intersects `[start, end)`.
pub fn overlaps(event: &CalendarEntry, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    match (event.start, event.end) {
        (Some(ev_start), Some(ev_end)) => ev_start < end && ev_end > start,
        (Some(ev_start), None) => ev_start >= start && ev_start < end,
        _ => false,
    }
}

pub fn event_summary(request: &BookingRequest) -> String {
    format!("{} - {}", request.service_type, request.customer_name)
}

pub fn event_description(request: &BookingRequest) -> String {
    let mut lines = vec![
        format!("Customer: {}", request.customer_name),
        format!("Phone: {}", request.customer_phone),
        format!("Email: {}", request.customer_email),
        format!("Vehicle: {} {}", request.car_make, request.car_model),
        format!("Service: {}", request.service_type),
    ];
    if let Some(notes) = &request.notes {
        lines.push(format!("Notes: {}", notes));
    }
    lines.join("\n")
}

/// Creates calendar events and their booking records.
///
/// Bookings for the same business day are serialized through an in-process
/// lock held from the conflict re-check until the event is inserted. Separate
/// server processes can still race between those two calls; the calendar API
/// offers no conditional insert.
pub struct BookingWriter {
    calendar: Arc<dyn CalendarService>,
    store: Arc<dyn BookingStore>,
    calendar_id: String,
    tz: Tz,
    persist_timeout: std::time::Duration,
    day_locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl BookingWriter {
    pub fn new(
        calendar: Arc<dyn CalendarService>,
        store: Arc<dyn BookingStore>,
        calendar_id: impl Into<String>,
        tz: Tz,
        persist_timeout: std::time::Duration,
    ) -> Self {
        Self {
            calendar,
            store,
            calendar_id: calendar_id.into(),
            tz,
            persist_timeout,
            day_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn day_lock(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.day_locks.lock().await;
        // Drop idle locks of other days.
        locks.retain(|day, lock| *day == date || Arc::strong_count(lock) > 1);
        locks.entry(date).or_default().clone()
    }

    pub async fn create_booking(&self, request: BookingRequest) -> Result<BookingRecord, BodyshopError> {
        self.create_booking_at(request, Utc::now()).await
    }

    /// Books as of `now`; slots starting earlier are rejected.
    pub async fn create_booking_at(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingRecord, BodyshopError> {
        let booking = validate_booking(&request, self.tz, now)?;
        let start_utc = booking.start.with_timezone(&Utc);
        let end_utc = booking.end.with_timezone(&Utc);
        let tz_name = self.tz.name();

        let day_lock = self.day_lock(booking.date).await;
        let guard = day_lock.lock().await;

        let existing = with_credential_retry(self.calendar.as_ref(), |calendar| {
            calendar.list_events(&self.calendar_id, start_utc, end_utc, tz_name)
        })
        .await
        .map_err(read_error)?;

        if existing.iter().any(|event| overlaps(event, start_utc, end_utc)) {
            warn!(start = %booking.start, date = %booking.date, "Requested slot already taken");
            return Err(BodyshopError::SlotConflict(format!(
                "{} is no longer available",
                booking.request.start_time
            )));
        }

        let new_event = NewCalendarEvent {
            summary: event_summary(&booking.request),
            description: event_description(&booking.request),
            start: booking.start,
            end: booking.end,
            time_zone: tz_name.to_string(),
        };
        let created = with_credential_retry(self.calendar.as_ref(), |calendar| {
            calendar.create_event(&self.calendar_id, new_event.clone())
        })
        .await
        .map_err(|err| {
            error!(start = %booking.start, error = %err, "Calendar event insert failed");
            BodyshopError::CalendarWriteError(err.to_string())
        })?;
        drop(guard);

        info!(event_id = %created.id, date = %booking.date, start = %booking.start, "Calendar event created");

        let ValidatedBooking { request, .. } = booking;
        let record = BookingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            calendar_event_id: created.id.clone(),
            html_link: created.html_link.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            customer_email: request.customer_email,
            car_make: request.car_make,
            car_model: request.car_model,
            service_type: request.service_type,
            notes: request.notes,
            created_at: Utc::now(),
        };

        let persisted = tokio::time::timeout(
            self.persist_timeout,
            self.store.insert_booking(record.clone()),
        )
        .await;
        let failure = match persisted {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(_) => Some(format!("timed out after {:?}", self.persist_timeout)),
        };
        if let Some(message) = failure {
            error!(
                orphaned_event_id = %created.id,
                error = %message,
                "Booking record not saved; calendar event needs manual reconciliation"
            );
            return Err(BodyshopError::PersistenceError {
                event_id: created.id,
                message,
            });
        }

        info!(event_id = %record.calendar_event_id, booking_id = %record.id, "Booking stored");
        Ok(record)
    }
}

impl BookingService for BookingWriter {
    fn create_booking(&self, request: BookingRequest) -> BoxFuture<'_, BookingRecord, BodyshopError> {
        Box::pin(BookingWriter::create_booking(self, request))
    }
}
