//! Live chat over a WebSocket at `/ws/{user_id}`.
//!
//! The user id doubles as the session id. Turns run on their own task so
//! the socket keeps reading; a message that arrives while a turn is still
//! running is answered with the busy notice instead of being queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wayfarer_chat::intent;
use wayfarer_chat::replies::{self, BUSY_TEXT};
use wayfarer_chat::TravelOrchestrator;

use crate::state::AppState;

/// GET /ws/{user_id}
pub async fn chat_socket(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let orchestrator = Arc::clone(&state.orchestrator);
    ws.on_upgrade(move |socket| run_socket(socket, user_id, orchestrator))
}

async fn run_socket(mut socket: WebSocket, user_id: String, orchestrator: Arc<TravelOrchestrator>) {
    info!(user_id = %user_id, "Chat connected");
    let welcome = replies::welcome_message(replies::greeting());
    if socket.send(WsMessage::Text(welcome.into())).await.is_err() {
        return;
    }

    let (tx, mut rx) = mpsc::channel::<String>(16);
    let in_flight = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let text = text.as_str().to_string();
                    if in_flight.swap(true, Ordering::AcqRel) {
                        debug!(user_id = %user_id, "Message arrived during a turn");
                        if socket.send(WsMessage::Text(BUSY_TEXT.into())).await.is_err() {
                            break;
                        }
                        continue;
                    }
                    if let Some(notice) = intent::progress_notice(&text) {
                        if socket.send(WsMessage::Text(notice.into())).await.is_err() {
                            break;
                        }
                    }
                    spawn_turn(
                        Arc::clone(&orchestrator),
                        user_id.clone(),
                        text,
                        tx.clone(),
                        Arc::clone(&in_flight),
                    );
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(user_id = %user_id, error = %e, "Chat socket error");
                    break;
                }
            },
            Some(reply) = rx.recv() => {
                if socket.send(WsMessage::Text(reply.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    orchestrator.clear_session(&user_id);
    info!(user_id = %user_id, "Chat disconnected");
}

fn spawn_turn(
    orchestrator: Arc<TravelOrchestrator>,
    user_id: String,
    text: String,
    tx: mpsc::Sender<String>,
    in_flight: Arc<AtomicBool>,
) {
    tokio::spawn(async move {
        let reply = orchestrator.handle_turn(&user_id, &text).await;
        in_flight.store(false, Ordering::Release);
        // The socket may already be gone; the reply is then dropped.
        let _ = tx.send(reply.text).await;
    });
}
