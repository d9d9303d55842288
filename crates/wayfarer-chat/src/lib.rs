//! Conversational travel assistant.
//!
//! Triage of incoming messages, the model decision, a single concurrent
//! tool round and the final synthesis, over per-session histories.

pub mod enrich;
pub mod error;
pub mod intent;
pub mod llm;
pub mod message;
pub mod orchestrator;
pub mod prompts;
pub mod replies;
pub mod session;
pub mod state;
pub mod synthesizer;

pub use error::ChatError;
pub use intent::Intent;
pub use llm::{ChatCompletionsClient, LanguageModel, ModelReply};
pub use message::{Message, Role, ToolRequest};
pub use orchestrator::{ReplyKind, TravelOrchestrator, TurnReply};
pub use session::{LiveLocation, SessionStore};
pub use state::TurnState;
