// File: crates/bodyshop_gcal/src/handlers.rs
use crate::booking::BookingWriter;
use crate::logic::{
    business_tz, parse_date, AvailabilityQuery, AvailabilityResolver, AvailabilityResponse,
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use bodyshop_common::error::BodyshopError;
use bodyshop_common::models::{BookingConfirmation, BookingRecord, BookingRequest};
use bodyshop_common::services::{BookingStore, CalendarService};
use bodyshop_config::AppConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// Shared state of the calendar routes
#[derive(Clone)]
pub struct GcalState {
    pub resolver: Arc<AvailabilityResolver>,
    pub writer: Arc<BookingWriter>,
    pub store: Arc<dyn BookingStore>,
}

impl GcalState {
    /// Wires resolver and writer around one calendar backend and one store.
    pub fn new(
        config: &AppConfig,
        calendar: Arc<dyn CalendarService>,
        store: Arc<dyn BookingStore>,
    ) -> Result<Self, BodyshopError> {
        let tz = business_tz(&config.business.time_zone)?;
        let (calendar_id, timeout_secs) = match config.gcal.as_ref() {
            Some(gcal) => (gcal.calendar_id.clone(), gcal.request_timeout_secs),
            None => ("primary".to_string(), 10),
        };

        let resolver = AvailabilityResolver::new(calendar.clone(), calendar_id.clone(), tz);
        let writer = BookingWriter::new(
            calendar,
            store.clone(),
            calendar_id,
            tz,
            Duration::from_secs(timeout_secs),
        );

        Ok(Self {
            resolver: Arc::new(resolver),
            writer: Arc::new(writer),
            store,
        })
    }
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct BookingsQuery {
    /// Day in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-06-02"))]
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingsResponse {
    pub bookings: Vec<BookingRecord>,
}

/// Handler to get the hourly slots of one day.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Hourly slots of the day", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid date"),
        (status = 401, description = "Calendar credentials expired, retry later"),
        (status = 500, description = "Calendar unavailable")
    ),
    tag = "Booking"
))]
pub async fn get_availability_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, BodyshopError> {
    let raw_date = query
        .date
        .ok_or_else(|| BodyshopError::ValidationError("Query parameter 'date' is required".to_string()))?;
    let date = parse_date(&raw_date)?;

    let time_slots = state.resolver.resolve_availability(date).await?;
    Ok(Json(AvailabilityResponse { time_slots }))
}

/// Handler to book one slot.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/booking",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Booking created", body = BookingConfirmation),
        (status = 400, description = "Missing fields or misaligned slot"),
        (status = 409, description = "Slot already taken"),
        (status = 500, description = "Calendar or persistence failure")
    ),
    tag = "Booking"
))]
pub async fn book_slot_handler(
    State(state): State<Arc<GcalState>>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookingConfirmation>, BodyshopError> {
    let record = state.writer.create_booking(request).await?;
    Ok(Json(BookingConfirmation::from(record)))
}

/// Handler listing stored booking records of one day, for reconciling them with the calendar.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/bookings",
    params(BookingsQuery),
    responses(
        (status = 200, description = "Stored bookings of the day", body = BookingsResponse),
        (status = 400, description = "Invalid date"),
        (status = 500, description = "Database failure")
    ),
    tag = "Booking"
))]
pub async fn get_bookings_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<BookingsResponse>, BodyshopError> {
    let date = parse_date(&query.date)?;
    let bookings = state.store.find_by_date(date).await.map_err(|err| {
        error!(%date, error = %err, "Failed to load booking records");
        BodyshopError::InternalError(format!("Failed to load bookings: {}", err))
    })?;
    info!(%date, count = bookings.len(), "Booking records listed");
    Ok(Json(BookingsResponse { bookings }))
}
