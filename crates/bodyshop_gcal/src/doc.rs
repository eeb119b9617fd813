// File: crates/bodyshop_gcal/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{BookingsQuery, BookingsResponse};
use crate::logic::{AvailabilityQuery, AvailabilityResponse};
use bodyshop_common::models::{BookingConfirmation, BookingRecord, BookingRequest, TimeSlot};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_availability_handler,
        crate::handlers::book_slot_handler,
        crate::handlers::get_bookings_handler
    ),
    components(
        schemas(
            AvailabilityQuery,
            AvailabilityResponse,
            TimeSlot,
            BookingRequest,
            BookingRecord,
            BookingConfirmation,
            BookingsQuery,
            BookingsResponse
        )
    ),
    tags(
        (name = "Booking", description = "Appointment availability and booking API")
    ),
    servers(
        (url = "/api", description = "Body shop API server")
    )
)]
pub struct GcalApiDoc;
