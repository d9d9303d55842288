//! Route handler functions for the `/api` endpoints.
//!
//! Every programmatic endpoint answers with the status vocabulary
//! (`ok`, `error`, `empty`, `success`, `partial`) plus a message. Only
//! malformed requests and chat contention map onto HTTP error codes.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use wayfarer_chat::replies::{self, BUSY_TEXT};
use wayfarer_chat::ReplyKind;
use wayfarer_core::types::{ApiStatus, SavedLocation};
use wayfarer_storage::StoredLocation;
use wayfarer_tools::tools::imagery;

use crate::error::ApiError;
use crate::state::AppState;

pub const LOCATION_RANGE_TEXT: &str =
    "Latitude must be between -90 and 90 and longitude between -180 and 180.";
pub const LOCATION_SAVE_FAILED_TEXT: &str =
    "Could not save your location, please try again in a moment.";
pub const LOCATION_LOAD_FAILED_TEXT: &str =
    "Could not read your saved location, please try again in a moment.";

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LocationBody {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub city_hint: Option<String>,
}

impl From<LocationBody> for SavedLocation {
    fn from(body: LocationBody) -> Self {
        SavedLocation {
            lat: body.lat,
            lon: body.lon,
            city_hint: body.city_hint.filter(|h| !h.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactBody {
    pub name: String,
    pub number: String,
    #[serde(default)]
    pub relation: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageParams {
    pub place: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
}

// =============================================================================
// Response types
// =============================================================================

/// Status plus whichever payload the endpoint carries.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ApiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<StoredLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<String>,
}

impl StatusResponse {
    fn new(status: ApiStatus) -> Self {
        Self {
            status,
            message: None,
            user_id: None,
            location: None,
            images: None,
        }
    }

    fn with_message(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(status)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub message: String,
    pub greeting: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReplyResponse {
    pub status: ApiStatus,
    pub reply: String,
    pub kind: String,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<ServerStatus> {
    Json(ServerStatus {
        status: "running".to_string(),
        message: "Travel Assistant API is running".to_string(),
        greeting: replies::greeting().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /api/location/{user_id}
pub async fn save_location(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<LocationBody>,
) -> Json<StatusResponse> {
    let location = SavedLocation::from(body);
    if !location.in_range() {
        return Json(StatusResponse::with_message(ApiStatus::Error, LOCATION_RANGE_TEXT));
    }
    match state.locations.save(&user_id, &location) {
        Ok(()) => {
            info!(user_id = %user_id, "Location saved");
            Json(StatusResponse {
                user_id: Some(user_id),
                ..StatusResponse::new(ApiStatus::Ok)
            })
        }
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Failed to save location");
            Json(StatusResponse::with_message(ApiStatus::Error, LOCATION_SAVE_FAILED_TEXT))
        }
    }
}

/// GET /api/location/{user_id}
pub async fn get_location(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<StatusResponse> {
    match state.locations.load(&user_id) {
        Ok(Some(stored)) => Json(StatusResponse {
            location: Some(stored),
            ..StatusResponse::new(ApiStatus::Ok)
        }),
        Ok(None) => Json(StatusResponse::new(ApiStatus::Empty)),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Failed to load location");
            Json(StatusResponse::with_message(ApiStatus::Error, LOCATION_LOAD_FAILED_TEXT))
        }
    }
}

/// POST /api/contacts/{user_id}
pub async fn add_contact(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<ContactBody>,
) -> Json<StatusResponse> {
    let reply = state
        .sos
        .add_contact(&user_id, &body.name, &body.number, &body.relation)
        .await;
    Json(StatusResponse::with_message(reply.status, reply.message))
}

/// GET /api/contacts/{user_id}
pub async fn list_contacts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<StatusResponse> {
    let reply = state.sos.list_contacts(&user_id).await;
    Json(StatusResponse::with_message(reply.status, reply.message))
}

/// POST /api/sos/{user_id} - alert every contact now.
///
/// The body is optional; without one the user's saved location is used.
pub async fn trigger_sos(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let supplied = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let parsed: LocationBody = serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid location body: {}", e)))?;
        Some(SavedLocation::from(parsed))
    };

    let location = match supplied {
        Some(location) => Some(location.describe()),
        None => match state.locations.load(&user_id) {
            Ok(stored) => stored.map(|s| s.location.describe()),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Saved location unavailable for SOS");
                None
            }
        },
    };

    let report = state.sos.trigger(&user_id, location, None).await;
    Ok(Json(StatusResponse::with_message(
        report.status(),
        report.summary(),
    )))
}

/// GET /api/images?place=
pub async fn images(
    State(state): State<AppState>,
    Query(params): Query<ImageParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let place = params
        .place
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Parameter 'place' is required".to_string()))?;

    let registry = state.orchestrator.registry();
    let result = imagery::run(
        registry.providers().images.as_deref(),
        registry.normalizer(),
        &place,
    )
    .await;

    Ok(Json(match result {
        Ok(text) => StatusResponse {
            images: Some(text),
            ..StatusResponse::new(ApiStatus::Success)
        },
        Err(e) => StatusResponse::with_message(ApiStatus::Error, e.to_string()),
    }))
}

/// POST /api/chat/{session_id} - one conversation turn.
pub async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatReplyResponse>, ApiError> {
    let reply = state
        .orchestrator
        .handle_turn(&session_id, &body.message)
        .await;

    let status = match reply.kind {
        ReplyKind::Busy => return Err(ApiError::Conflict(BUSY_TEXT.to_string())),
        ReplyKind::Rejected | ReplyKind::Fallback => ApiStatus::Error,
        _ => ApiStatus::Success,
    };
    Ok(Json(ChatReplyResponse {
        status,
        reply: reply.text,
        kind: reply.kind.to_string(),
    }))
}

/// DELETE /api/chat/{session_id}
pub async fn clear_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<StatusResponse> {
    if state.orchestrator.clear_session(&session_id) {
        Json(StatusResponse::with_message(ApiStatus::Ok, "Session cleared"))
    } else {
        Json(StatusResponse::new(ApiStatus::Empty))
    }
}
