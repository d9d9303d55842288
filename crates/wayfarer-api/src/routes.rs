//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wayfarer_core::{WayfarerConfig, WayfarerError};

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;
use crate::ws;

/// Request bodies are small JSON documents.
const BODY_LIMIT: usize = 64 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/status", get(handlers::status))
        .route(
            "/api/location/{user_id}",
            get(handlers::get_location).post(handlers::save_location),
        )
        .route(
            "/api/contacts/{user_id}",
            get(handlers::list_contacts).post(handlers::add_contact),
        )
        .route("/api/sos/{user_id}", post(handlers::trigger_sos))
        .route("/api/images", get(handlers::images))
        .route(
            "/api/chat/{session_id}",
            post(handlers::chat).delete(handlers::clear_chat),
        )
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(RateLimiter::default()));

    // Long-lived sockets are exempt from rate limiting.
    let socket_routes = Router::new().route("/ws/{user_id}", get(ws::chat_socket));

    api_routes
        .merge(socket_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router on all interfaces at the configured port.
pub async fn start_server(config: &WayfarerConfig, state: AppState) -> Result<(), WayfarerError> {
    let addr = format!("0.0.0.0:{}", config.general.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WayfarerError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| WayfarerError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
