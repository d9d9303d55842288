//! The capability tools. Each module pairs a pure formatter with an async
//! `run` that resolves the location, calls its provider and renders text.

pub mod advice;
pub mod budget;
pub mod imagery;
pub mod itinerary;
pub mod landmarks;
pub mod lodging;
pub mod news;
pub mod places;
pub mod routing;
pub mod weather;

use wayfarer_core::LocationResolution;

use crate::error::ToolError;

/// Prefix a successful body with a notice about a location correction.
///
/// `confirm` builds the suggestion notice (correction needs confirmation),
/// `auto` the notice for a silent correction; both receive the resolved name.
pub(crate) fn annotate(
    resolution: &LocationResolution,
    body: String,
    confirm: impl FnOnce(&str) -> String,
    auto: impl FnOnce(&str) -> String,
) -> String {
    if resolution.needs_confirmation {
        format!("{}{}", confirm(&resolution.resolved_name), body)
    } else if resolution.was_corrected {
        format!("{}{}", auto(&resolution.resolved_name), body)
    } else {
        body
    }
}

/// Trimmed, non-empty argument or an `InvalidArguments` error with `message`.
pub(crate) fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, ToolError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ToolError::InvalidArguments(message.to_string()))
    } else {
        Ok(value)
    }
}

/// At most `max` characters, with "..." replacing the tail of longer text.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
