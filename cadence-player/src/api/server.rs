//! HTTP server setup and routing
//!
//! Axum router with the playback control endpoints and the SSE stream.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use cadence_common::events::EventBus;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::playback::EngineHandle;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: EngineHandle,
    pub events: EventBus,
}

/// Build the router (also used directly by tests)
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/playback/state", get(super::handlers::get_state))
        .route("/playback/pause", post(super::handlers::toggle_pause))
        .route("/playback/next", post(super::handlers::next))
        .route("/playback/previous", post(super::handlers::previous))
        .route("/playback/exit", post(super::handlers::exit))
        .route("/audio/enable", post(super::handlers::enable_audio))
        .route("/events", get(super::sse::event_stream))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Serve until `shutdown` is cancelled
pub async fn run(config: &ServerConfig, ctx: AppContext, shutdown: CancellationToken) -> Result<()> {
    let app = create_router(ctx);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|e| Error::Config(format!("invalid bind address: {}", e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("failed to bind {}: {}", addr, e)))?;

    info!("Cadence player API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| Error::Http(format!("server error: {}", e)))?;

    Ok(())
}
