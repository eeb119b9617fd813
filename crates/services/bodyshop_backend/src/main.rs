// File: services/bodyshop_backend/src/main.rs
use bodyshop_backend::{build_router, AppState};
use bodyshop_common::logging;
use bodyshop_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(load_config()?);
    // Held for the whole run so the file writer flushes on exit.
    let _log_guard = logging::init_from_config(&config.logging);

    let state = AppState::new(config.clone()).await?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Starting server");
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
