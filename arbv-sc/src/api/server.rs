//! HTTP router setup
//!
//! Sets up the Axum router with control endpoints and SSE.

use crate::emulator::TrackingInjector;
use crate::registry::TargetRegistry;
use crate::session::Session;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application context passed to all handlers
///
/// Implements Clone, which gives us `FromRef<AppContext>` for free via
/// Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub session: Session,
    pub registry: Arc<TargetRegistry>,
    /// Present when the service runs against the emulated tracking source;
    /// enables the found/lost injection routes
    pub injector: Option<TrackingInjector>,
}

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Session surface
        .route("/session/status", get(super::handlers::get_status))
        .route("/session/toggle-play", post(super::handlers::toggle_play))
        .route("/session/toggle-mute", post(super::handlers::toggle_mute))
        .route("/session/gesture", post(super::handlers::gesture))
        // Target set
        .route("/targets", get(super::handlers::get_targets))
        // Tracking event injection (emulated source only)
        .route("/tracking/found/:id", post(super::handlers::inject_found))
        .route("/tracking/lost/:id", post(super::handlers::inject_lost))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
