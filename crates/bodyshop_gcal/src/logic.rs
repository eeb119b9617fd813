// --- File: crates/bodyshop_gcal/src/logic.rs ---
use bodyshop_common::error::BodyshopError;
use bodyshop_common::models::TimeSlot;
use bodyshop_common::services::{
    BoxFuture, CalendarEntry, CalendarService, CalendarServiceError, SlotAvailability,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// First bookable hour, business-local.
pub const OPEN_HOUR: u32 = 9;
/// Closing hour; the last slot starts one hour earlier.
pub const CLOSE_HOUR: u32 = 17;

// --- Data Structures ---
#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AvailabilityQuery {
    /// Day in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-06-02"))]
    pub date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub time_slots: Vec<TimeSlot>,
}

/// Parses the configured IANA zone name.
pub fn business_tz(name: &str) -> Result<Tz, BodyshopError> {
    Tz::from_str(name)
        .map_err(|_| BodyshopError::ConfigError(format!("Unknown business time zone '{}'", name)))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, BodyshopError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        BodyshopError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
    })
}

/// "9:00 AM", "12:00 PM", "4:00 PM".
pub fn slot_label(hour: u32) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:00 {}", display, suffix)
}

/// Local start of `hour` on `date`, or `None` if the wall time does not exist.
pub fn local_hour_start(date: NaiveDate, hour: u32, tz: Tz) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

/// Business-hours window of `date` as UTC instants: `[09:00, 17:00)` local.
pub fn business_window(date: NaiveDate, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let open = local_hour_start(date, OPEN_HOUR, tz)?;
    let close = local_hour_start(date, CLOSE_HOUR, tz)?;
    Some((open.with_timezone(&Utc), close.with_timezone(&Utc)))
}

/// Hourly slots for `date`, all marked available.
///
/// Slots starting strictly before `now` are left out, so a request made after
/// 16:00 local for today yields nothing.
pub fn generate_slots(date: NaiveDate, now: DateTime<Utc>, tz: Tz) -> Vec<TimeSlot> {
    (OPEN_HOUR..CLOSE_HOUR)
        .filter_map(|hour| {
            let start = local_hour_start(date, hour, tz)?;
            if start.with_timezone(&Utc) < now {
                return None;
            }
            let end = start + Duration::hours(1);
            Some(TimeSlot {
                label: slot_label(hour),
                start_time: start.to_rfc3339(),
                end_time: end.to_rfc3339(),
                available: true,
            })
        })
        .collect()
}

/// Marks a slot unavailable when an event on `date` starts within the slot's hour.
///
/// Events without a timed start (all-day events) never occupy a bucket.
pub fn mark_unavailable(slots: &mut [TimeSlot], events: &[CalendarEntry], date: NaiveDate, tz: Tz) {
    let busy_hours: Vec<u32> = events
        .iter()
        .filter_map(|event| event.start)
        .map(|start| start.with_timezone(&tz))
        .filter(|start| start.date_naive() == date)
        .map(|start| start.hour())
        .collect();

    for slot in slots.iter_mut() {
        let Ok(start) = DateTime::parse_from_rfc3339(&slot.start_time) else {
            continue;
        };
        if busy_hours.contains(&start.with_timezone(&tz).hour()) {
            slot.available = false;
        }
    }
}

/// Runs `op`, and on an expired credential refreshes once and runs it again.
///
/// No other retries: any other error, or a second failure, is returned as is.
pub async fn with_credential_retry<'a, T, F>(
    calendar: &'a dyn CalendarService,
    op: F,
) -> Result<T, CalendarServiceError>
where
    F: Fn(&'a dyn CalendarService) -> BoxFuture<'a, T, CalendarServiceError>,
{
    match op(calendar).await {
        Err(err) if err.is_credential_expired() => {
            warn!(error = %err, "Calendar credentials rejected, refreshing once");
            calendar.refresh_credentials().await?;
            op(calendar).await
        }
        other => other,
    }
}

/// Maps a failed calendar read to the public taxonomy.
pub fn read_error(err: CalendarServiceError) -> BodyshopError {
    match err {
        CalendarServiceError::CredentialExpired(msg) => BodyshopError::CredentialExpired(msg),
        other => BodyshopError::CalendarUnavailable(other.to_string()),
    }
}

// --- Availability ---

/// Read-only view of a day's free and busy hours.
pub struct AvailabilityResolver {
    calendar: Arc<dyn CalendarService>,
    calendar_id: String,
    tz: Tz,
}

impl AvailabilityResolver {
    pub fn new(calendar: Arc<dyn CalendarService>, calendar_id: impl Into<String>, tz: Tz) -> Self {
        Self {
            calendar,
            calendar_id: calendar_id.into(),
            tz,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub async fn resolve_availability(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, BodyshopError> {
        self.resolve_availability_at(date, Utc::now()).await
    }

    /// Same as [`resolve_availability`](Self::resolve_availability) with an explicit clock.
    pub async fn resolve_availability_at(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, BodyshopError> {
        let mut slots = generate_slots(date, now, self.tz);
        let Some((time_min, time_max)) = business_window(date, self.tz) else {
            return Ok(slots);
        };

        let tz_name = self.tz.name();
        let events = with_credential_retry(self.calendar.as_ref(), |calendar| {
            calendar.list_events(&self.calendar_id, time_min, time_max, tz_name)
        })
        .await
        .map_err(|err| {
            warn!(%date, error = %err, "Failed to list calendar events");
            read_error(err)
        })?;

        mark_unavailable(&mut slots, &events, date, self.tz);
        debug!(
            %date,
            events = events.len(),
            free = slots.iter().filter(|s| s.available).count(),
            "Resolved availability"
        );
        info!(%date, slots = slots.len(), "Availability served");
        Ok(slots)
    }
}

impl SlotAvailability for AvailabilityResolver {
    fn available_slots(&self, date: NaiveDate) -> BoxFuture<'_, Vec<TimeSlot>, BodyshopError> {
        Box::pin(async move {
            let slots = self.resolve_availability(date).await?;
            Ok(slots.into_iter().filter(|slot| slot.available).collect())
        })
    }
}
