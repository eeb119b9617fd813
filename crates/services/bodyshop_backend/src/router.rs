// File: crates/services/bodyshop_backend/src/router.rs
use crate::app_state::AppState;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    /// "ok", "unavailable" or "disabled"
    pub database: String,
}

async fn welcome(State(state): State<Arc<AppState>>) -> String {
    format!("Welcome to the {} API!", state.config.business.name)
}

#[axum::debug_handler]
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match &state.db {
        Some(db) => {
            if db.is_healthy().await {
                (StatusCode::OK, "ok")
            } else {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            }
        }
        None => (StatusCode::OK, "disabled"),
    };
    let body = HealthResponse {
        status: if status.is_success() { "ok" } else { "degraded" }.to_string(),
        database: database.to_string(),
    };
    (status, Json(body))
}

/// Mounts every enabled feature under `/api` with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let gcal_state = state.gcal_state.clone();
    let chat_state = state.chat_state.clone();

    let mut api = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .with_state(Arc::new(state));
    if let Some(gcal_state) = gcal_state {
        api = api.merge(bodyshop_gcal::routes(gcal_state));
    }
    if let Some(chat_state) = chat_state {
        api = api.merge(bodyshop_chat::routes(chat_state));
    }

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = Router::new().nest("/api", api);

    #[cfg(feature = "openapi")]
    {
        use bodyshop_chat::doc::ChatApiDoc;
        use bodyshop_gcal::doc::GcalApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Body Shop Booking API",
                version = "0.1.0",
                description = "Appointment availability, booking and chat assistant"
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(GcalApiDoc::openapi());
        openapi_doc.merge(ChatApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    app.layer(TraceLayer::new_for_http()).layer(cors)
}
