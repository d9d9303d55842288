//! Wayfarer API crate - axum HTTP server, route handlers, WebSocket chat.
//!
//! Exposes the status/query surface for programmatic callers (locations,
//! emergency contacts, SOS triggers, imagery), a JSON chat endpoint and
//! the live chat socket.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
