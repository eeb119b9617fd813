// --- File: crates/bodyshop_gcal/src/lib.rs ---
pub mod auth;
pub mod booking;
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod routes;
pub mod service;
#[cfg(test)]
mod test_support;

pub use booking::BookingWriter;
pub use handlers::GcalState;
pub use logic::{generate_slots, slot_label, AvailabilityResolver};
pub use routes::{gcal_state_from_config, routes};
pub use service::GoogleCalendarService;
