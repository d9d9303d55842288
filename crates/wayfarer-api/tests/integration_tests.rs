//! Integration tests for the Wayfarer API.
//!
//! Each test builds its own state: in-memory SQLite, a contact file in a
//! temp dir, the simulated alert channel and a canned language model.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use wayfarer_api::create_router;
use wayfarer_api::handlers::{
    ChatReplyResponse, ServerStatus, LOCATION_LOAD_FAILED_TEXT, LOCATION_RANGE_TEXT,
    LOCATION_SAVE_FAILED_TEXT,
};
use wayfarer_api::state::AppState;
use wayfarer_chat::{ChatError, LanguageModel, Message, ModelReply, SessionStore, TravelOrchestrator};
use wayfarer_core::{LocationNormalizer, WayfarerConfig, WayfarerError};
use wayfarer_sos::{LocalContactFile, SimulatedChannel, SosService, NO_CONTACTS_TEXT};
use wayfarer_storage::{ContactRepository, Database, LocationRepository};
use wayfarer_tools::{Providers, ToolRegistry};

// =============================================================================
// Helpers
// =============================================================================

/// Answers every decision directly, never requesting tools.
struct CannedModel;

#[async_trait]
impl LanguageModel for CannedModel {
    async fn decide(&self, _messages: &[Message], _tools: &[Value]) -> Result<ModelReply, ChatError> {
        Ok(ModelReply::text("Namaste! Goa is lovely in December."))
    }

    async fn complete(&self, _messages: &[Message]) -> Result<String, ChatError> {
        Ok("synthesized".to_string())
    }
}

fn make_state(dir: &Path) -> AppState {
    let db = Arc::new(Database::in_memory().unwrap());
    let sos = Arc::new(
        SosService::new(
            Arc::new(ContactRepository::new(Arc::clone(&db))),
            Arc::new(LocalContactFile::new(dir.join("emergency_contacts.json"))),
            Arc::new(SimulatedChannel),
        )
        .with_send_delay(Duration::ZERO),
    );
    let registry = ToolRegistry::new(Providers::default(), Arc::new(LocationNormalizer::default()))
        .with_sos(Arc::clone(&sos));
    let orchestrator = TravelOrchestrator::new(
        Arc::new(CannedModel),
        registry,
        Arc::new(SessionStore::new()),
    );
    AppState::new(
        WayfarerConfig::default(),
        orchestrator,
        sos,
        LocationRepository::new(db),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let resp = create_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

async fn add_contact(state: &AppState, user: &str, name: &str, number: &str) {
    let body = format!(r#"{{"name": "{}", "number": "{}", "relation": "family"}}"#, name, number);
    let (code, json) = send(state, post_json(&format!("/api/contacts/{}", user), &body)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "success");
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn test_status_running() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let resp = create_router(state).oneshot(get("/api/status")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let status: ServerStatus = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status.status, "running");
    assert!(status.greeting.starts_with("Good "));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let resp = create_router(state).oneshot(get("/api/nowhere")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Locations
// =============================================================================

#[tokio::test]
async fn test_location_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());

    let (code, json) = send(
        &state,
        post_json("/api/location/u1", r#"{"lat": 15.49, "lon": 73.82, "city_hint": "Panaji"}"#),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["user_id"], "u1");

    let (_, json) = send(&state, get("/api/location/u1")).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["location"]["lat"], 15.49);
    assert_eq!(json["location"]["city_hint"], "Panaji");
}

#[tokio::test]
async fn test_location_missing_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (code, json) = send(&state, get("/api/location/nobody")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "empty");
}

#[tokio::test]
async fn test_location_out_of_range_is_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (code, json) = send(&state, post_json("/api/location/u1", r#"{"lat": 200.0, "lon": 10.0}"#)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], LOCATION_RANGE_TEXT);
}

#[tokio::test]
async fn test_location_storage_failure_hides_database_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::in_memory().unwrap());
    db.with_conn(|conn| {
        conn.execute_batch("DROP TABLE locations")
            .map_err(|e| WayfarerError::Storage(e.to_string()))
    })
    .unwrap();
    let state = AppState {
        locations: LocationRepository::new(db),
        ..make_state(dir.path())
    };

    let (code, json) = send(&state, post_json("/api/location/u1", r#"{"lat": 9.93, "lon": 76.26}"#)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], LOCATION_SAVE_FAILED_TEXT);

    let (_, json) = send(&state, get("/api/location/u1")).await;
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], LOCATION_LOAD_FAILED_TEXT);
    assert!(!json["message"].as_str().unwrap().contains("no such table"));
}

// =============================================================================
// Contacts
// =============================================================================

#[tokio::test]
async fn test_add_and_list_contacts() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    add_contact(&state, "u1", "Asha", "98765 43210").await;

    let (_, json) = send(&state, get("/api/contacts/u1")).await;
    assert_eq!(json["status"], "success");
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("Asha"));
    assert!(message.contains("+919876543210"));
}

#[tokio::test]
async fn test_invalid_contact_is_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (_, json) = send(
        &state,
        post_json("/api/contacts/u1", r#"{"name": "Asha", "number": "12"}"#),
    )
    .await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().starts_with("❌ Failed to add contact"));
}

#[tokio::test]
async fn test_contacts_are_per_user() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    add_contact(&state, "u1", "Asha", "9876543210").await;

    let (_, json) = send(&state, get("/api/contacts/u2")).await;
    assert!(!json["message"].as_str().unwrap().contains("Asha"));
}

// =============================================================================
// SOS
// =============================================================================

#[tokio::test]
async fn test_sos_without_contacts_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (code, json) = send(&state, post_empty("/api/sos/u1")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], NO_CONTACTS_TEXT);
}

#[tokio::test]
async fn test_sos_alerts_every_contact() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    add_contact(&state, "u1", "Asha", "9876543210").await;
    add_contact(&state, "u1", "Ravi", "9123456780").await;

    let (_, json) = send(
        &state,
        post_json("/api/sos/u1", r#"{"lat": 9.93, "lon": 76.26, "city_hint": "Kochi"}"#),
    )
    .await;
    assert_eq!(json["status"], "success");
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("(2/2 sent)"));
    assert!(message.contains("✅ Asha"));
    assert!(message.contains("✅ Ravi"));
}

#[tokio::test]
async fn test_sos_uses_saved_location_without_body() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    add_contact(&state, "u1", "Asha", "9876543210").await;
    send(&state, post_json("/api/location/u1", r#"{"lat": 9.93, "lon": 76.26}"#)).await;

    let (_, json) = send(&state, post_empty("/api/sos/u1")).await;
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn test_sos_malformed_body_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (code, json) = send(&state, post_json("/api/sos/u1", "{not json")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

// =============================================================================
// Images
// =============================================================================

#[tokio::test]
async fn test_images_requires_place() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (code, json) = send(&state, get("/api/images")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");

    let (code, _) = send(&state, get("/api/images?place=")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_images_without_provider_is_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (code, json) = send(&state, get("/api/images?place=Goa")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert!(json.get("images").is_none());
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_direct_reply() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let resp = create_router(state.clone())
        .oneshot(post_json("/api/chat/s1", r#"{"message": "Is Goa nice in December?"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let reply: ChatReplyResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply.kind, "direct");
    assert_eq!(reply.reply, "Namaste! Goa is lovely in December.");
    assert_eq!(state.orchestrator.sessions().history("s1").await.len(), 2);
}

#[tokio::test]
async fn test_chat_empty_message_gets_help() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (_, json) = send(&state, post_json("/api/chat/s1", r#"{"message": "  "}"#)).await;
    assert_eq!(json["kind"], "help");
    assert_eq!(json["status"], "success");
}

#[tokio::test]
async fn test_chat_emergency_guidance() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let (_, json) = send(&state, post_json("/api/chat/s1", r#"{"message": "SOS"}"#)).await;
    assert_eq!(json["kind"], "emergency");
    assert!(json["reply"].as_str().unwrap().contains("SOS button"));
}

#[tokio::test]
async fn test_chat_busy_session_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let _turn = state.orchestrator.sessions().begin_turn("s1").unwrap();

    let (code, json) = send(&state, post_json("/api/chat/s1", r#"{"message": "hello"}"#)).await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn test_chat_missing_message_field_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    let resp = create_router(state)
        .oneshot(post_json("/api/chat/s1", r#"{"text": "hello"}"#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_clear_chat() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());
    send(&state, post_json("/api/chat/s1", r#"{"message": "hello"}"#)).await;

    let (_, json) = send(&state, delete("/api/chat/s1")).await;
    assert_eq!(json["status"], "ok");
    assert!(state.orchestrator.sessions().history("s1").await.is_empty());

    let (_, json) = send(&state, delete("/api/chat/s1")).await;
    assert_eq!(json["status"], "empty");
}
