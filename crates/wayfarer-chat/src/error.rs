//! Error types for the conversation engine.

use crate::state::TurnState;

/// Errors raised inside one conversational turn.
///
/// None of these reach the user verbatim: the orchestrator turns them into
/// a templated reply at the turn boundary.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),

    #[error("session {0} is still processing a turn")]
    Busy(String),

    #[error("invalid session history: {0}")]
    InvalidHistory(String),

    #[error("invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnState, to: TurnState },

    #[error("language model not configured: {0}")]
    NotConfigured(String),

    #[error("language model timed out after {0}s")]
    LlmTimeout(u64),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("tool dispatch failed: {0}")]
    Dispatch(String),
}
