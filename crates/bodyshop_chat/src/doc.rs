// File: crates/bodyshop_chat/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::logic::{ChatRequest, ChatResponse, ConversationState, Stage};

#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::chat_turn_handler),
    components(schemas(ChatRequest, ChatResponse, ConversationState, Stage)),
    tags(
        (name = "Chat", description = "Booking assistant conversation API")
    ),
    servers(
        (url = "/api", description = "Body shop API server")
    )
)]
pub struct ChatApiDoc;
