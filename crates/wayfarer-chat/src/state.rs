//! Per-turn control states and their legal transitions.

use std::fmt;

use serde::Serialize;

use crate::error::ChatError;

/// Where a single turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingInput,
    Deciding,
    DirectReply,
    DispatchingTools,
    Synthesizing,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::AwaitingInput => write!(f, "awaiting_input"),
            TurnState::Deciding => write!(f, "deciding"),
            TurnState::DirectReply => write!(f, "direct_reply"),
            TurnState::DispatchingTools => write!(f, "dispatching_tools"),
            TurnState::Synthesizing => write!(f, "synthesizing"),
        }
    }
}

impl std::str::FromStr for TurnState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_input" => Ok(TurnState::AwaitingInput),
            "deciding" => Ok(TurnState::Deciding),
            "direct_reply" => Ok(TurnState::DirectReply),
            "dispatching_tools" => Ok(TurnState::DispatchingTools),
            "synthesizing" => Ok(TurnState::Synthesizing),
            _ => Err(format!("Unknown turn state: {}", s)),
        }
    }
}

/// Whether `from -> to` is a legal step.
///
/// Dispatch can only lead to synthesis, so a turn never re-enters
/// `Deciding` after tools ran.
pub fn validate_transition(from: TurnState, to: TurnState) -> bool {
    use TurnState::*;
    matches!(
        (from, to),
        (AwaitingInput, Deciding)
            | (Deciding, DirectReply)
            | (Deciding, DispatchingTools)
            | (DispatchingTools, Synthesizing)
            | (DirectReply, AwaitingInput)
            | (Synthesizing, AwaitingInput)
    )
}

/// Tracks one turn's path through the states.
#[derive(Debug, Clone)]
pub struct TurnMachine {
    state: TurnState,
    trace: Vec<TurnState>,
}

impl TurnMachine {
    pub fn new() -> Self {
        Self {
            state: TurnState::AwaitingInput,
            trace: vec![TurnState::AwaitingInput],
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn advance(&mut self, to: TurnState) -> Result<(), ChatError> {
        if !validate_transition(self.state, to) {
            return Err(ChatError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.trace.push(to);
        Ok(())
    }

    /// Every state visited so far, starting with `AwaitingInput`.
    pub fn trace(&self) -> &[TurnState] {
        &self.trace
    }

    /// How many times tools were dispatched in this turn.
    pub fn dispatch_rounds(&self) -> usize {
        self.trace
            .iter()
            .filter(|s| **s == TurnState::DispatchingTools)
            .count()
    }
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new()
    }
}
