//! HTTP request handlers
//!
//! Implements the REST endpoints for the session surface.

use crate::api::server::AppContext;
use crate::registry::Target;
use crate::state::SessionStatus;
use arbv_common::TargetId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::debug;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    targets: Vec<TargetInfo>,
}

#[derive(Debug, Serialize)]
pub struct TargetInfo {
    id: TargetId,
    index: usize,
    title: Option<String>,
    marker_image: String,
    video_url: Option<String>,
    audio_url: Option<String>,
    image_url: Option<String>,
}

impl From<&Target> for TargetInfo {
    fn from(target: &Target) -> Self {
        Self {
            id: target.id,
            index: target.index,
            title: target.title.clone(),
            marker_image: target.marker_image.clone(),
            video_url: target.video_url.clone(),
            audio_url: target.audio_url.clone(),
            image_url: target.image_url.clone(),
        }
    }
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "session_controller".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Session Endpoints
// ============================================================================

/// GET /session/status - Current session snapshot
pub async fn get_status(State(ctx): State<AppContext>) -> Json<SessionStatus> {
    Json(ctx.session.status().await)
}

/// POST /session/toggle-play - Flip the play flag
pub async fn toggle_play(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.session.toggle_play();
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /session/toggle-mute - Flip the mute flag
pub async fn toggle_mute(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.session.toggle_mute();
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /session/gesture - Report a user gesture (unlock handshake)
pub async fn gesture(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.session.user_gesture();
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Target Endpoints
// ============================================================================

/// GET /targets - Configured target set in tracking order
pub async fn get_targets(State(ctx): State<AppContext>) -> Json<TargetsResponse> {
    Json(TargetsResponse {
        targets: ctx.registry.list().iter().map(TargetInfo::from).collect(),
    })
}

// ============================================================================
// Tracking Injection Endpoints (emulated source only)
// ============================================================================

/// POST /tracking/found/:id - Inject a found event
pub async fn inject_found(
    State(ctx): State<AppContext>,
    Path(id): Path<u32>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    inject(&ctx, id, true)
}

/// POST /tracking/lost/:id - Inject a lost event
pub async fn inject_lost(
    State(ctx): State<AppContext>,
    Path(id): Path<u32>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    inject(&ctx, id, false)
}

fn inject(
    ctx: &AppContext,
    id: u32,
    found: bool,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    let Some(injector) = &ctx.injector else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse {
                status: "tracking injection not available".to_string(),
            }),
        ));
    };

    let id = TargetId(id);
    let delivered = if found {
        injector.found(id)
    } else {
        injector.lost(id)
    };

    if !delivered {
        return Err((
            StatusCode::CONFLICT,
            Json(StatusResponse {
                status: "tracking source stopped".to_string(),
            }),
        ));
    }

    debug!(
        "Injected {} event for target {}",
        if found { "found" } else { "lost" },
        id
    );
    Ok(Json(StatusResponse {
        status: "delivered".to_string(),
    }))
}
