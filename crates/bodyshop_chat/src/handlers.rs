// File: crates/bodyshop_chat/src/handlers.rs
use crate::logic::{ChatEngine, ChatRequest, ChatResponse};
use axum::{extract::State, response::Json};
use chrono::Utc;
use std::sync::Arc;

// Shared state of the chat route
pub struct ChatState {
    pub engine: ChatEngine,
}

/// Handler for one assistant turn. The caller sends back the `bookingDetails`
/// it received last time; nothing is kept on the server.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply and updated conversation state", body = ChatResponse),
        (status = 422, description = "Body without a message")
    ),
    tag = "Chat"
))]
pub async fn chat_turn_handler(
    State(state): State<Arc<ChatState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let conversation = request.booking_details.unwrap_or_default();
    let turn = state
        .engine
        .run_turn(conversation, &request.message, Utc::now())
        .await;
    Json(ChatResponse::from(turn))
}
