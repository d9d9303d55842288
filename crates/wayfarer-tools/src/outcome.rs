//! Tool outcomes and their rendering to conversation text.

use crate::error::ToolError;

/// Prefix marking a rendered tool result as a failure.
pub const FAILURE_MARKER: &str = "❌";

/// Result of one tool invocation, kept typed until it reaches the
/// conversation.
#[derive(Debug)]
pub struct ToolOutcome {
    pub tool: String,
    pub result: Result<String, ToolError>,
}

impl ToolOutcome {
    pub fn new(tool: impl Into<String>, result: Result<String, ToolError>) -> Self {
        Self {
            tool: tool.into(),
            result,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Displayable text; failures carry the marker exactly once.
    pub fn render(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(e) => {
                let text = e.to_string();
                if is_failure_text(&text) {
                    text
                } else {
                    format!("{} {}", FAILURE_MARKER, text)
                }
            }
        }
    }
}

/// Whether already-rendered text reports a failure.
pub fn is_failure_text(text: &str) -> bool {
    text.trim_start().starts_with(FAILURE_MARKER)
}
