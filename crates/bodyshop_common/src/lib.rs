// --- File: crates/bodyshop_common/src/lib.rs ---

pub mod error; // Error taxonomy
pub mod http; // HTTP error responses
pub mod logging; // Subscriber setup
pub mod models; // Booking data structures
pub mod services; // Service abstractions

pub use error::{
    config_error, internal_error, validation_error, BodyshopError, Context, HttpStatusCode,
};

pub use http::{handle_json_result, IntoHttpResponse};

pub use models::{
    normalize_phone, normalized_phone, BookingConfirmation, BookingRecord, BookingRequest,
    TimeSlot,
};

pub use services::{
    BookingService, BookingStore, BoxFuture, BoxedError, CalendarEntry, CalendarService,
    CalendarServiceError, CreatedEvent, NewCalendarEvent, SlotAvailability,
};
