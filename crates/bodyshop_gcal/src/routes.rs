// --- File: crates/bodyshop_gcal/src/routes.rs ---

use crate::handlers::{
    book_slot_handler, get_availability_handler, get_bookings_handler, GcalState,
};
use crate::service::GoogleCalendarService;
use axum::{
    routing::{get, post},
    Router,
};
use bodyshop_common::error::BodyshopError;
use bodyshop_common::services::{BookingStore, CalendarService};
use bodyshop_config::AppConfig;
use std::sync::Arc;

/// Builds the calendar state against Google Calendar using the `[gcal]` section.
pub fn gcal_state_from_config(
    config: &AppConfig,
    store: Arc<dyn BookingStore>,
) -> Result<Arc<GcalState>, BodyshopError> {
    let gcal_config = config
        .gcal
        .clone()
        .ok_or_else(|| BodyshopError::ConfigError("GCal config missing".to_string()))?;
    let calendar: Arc<dyn CalendarService> = Arc::new(
        GoogleCalendarService::new(gcal_config)
            .map_err(|e| BodyshopError::ConfigError(e.to_string()))?,
    );
    Ok(Arc::new(GcalState::new(config, calendar, store)?))
}

/// Creates a router containing the availability, booking and admin routes.
pub fn routes(state: Arc<GcalState>) -> Router {
    Router::new()
        .route("/availability", get(get_availability_handler))
        .route("/booking", post(book_slot_handler))
        .route("/admin/bookings", get(get_bookings_handler))
        .with_state(state)
}
