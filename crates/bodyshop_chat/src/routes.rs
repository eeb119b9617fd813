// --- File: crates/bodyshop_chat/src/routes.rs ---

use crate::handlers::{chat_turn_handler, ChatState};
use crate::logic::ChatEngine;
use axum::{routing::post, Router};
use bodyshop_common::error::BodyshopError;
use bodyshop_common::services::{BookingService, SlotAvailability};
use bodyshop_config::AppConfig;
use std::sync::Arc;

/// Builds the chat state around a booking backend and optional live availability.
pub fn chat_state(
    config: &AppConfig,
    booking: Arc<dyn BookingService>,
    availability: Option<Arc<dyn SlotAvailability>>,
) -> Result<Arc<ChatState>, BodyshopError> {
    let engine = ChatEngine::new(booking, availability, config.business.clone())?;
    Ok(Arc::new(ChatState { engine }))
}

pub fn routes(state: Arc<ChatState>) -> Router {
    Router::new()
        .route("/chat", post(chat_turn_handler))
        .with_state(state)
}
