//! Capability tools for the Wayfarer travel assistant.
//!
//! Each tool wraps one data capability (weather, places, routing, lodging,
//! imagery, news, static travel guidance, emergency contacts) behind a typed
//! call. Outcomes stay typed as `Result<String, ToolError>` until they are
//! rendered into conversation text by [`ToolOutcome::render`].

pub mod call;
pub mod error;
mod http;
pub mod outcome;
pub mod providers;
pub mod registry;
pub mod tools;

pub use call::{ToolCall, ToolName};
pub use error::ToolError;
pub use outcome::{is_failure_text, ToolOutcome, FAILURE_MARKER};
pub use providers::Providers;
pub use registry::{ToolContext, ToolRegistry};
