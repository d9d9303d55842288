//! Photo links for a place.

use wayfarer_core::LocationNormalizer;

use crate::error::{ToolError, IMAGE_SERVICE};
use crate::providers::{ImageSource, Photo};
use crate::tools::{annotate, required, truncate};

/// Link labels, cycled by result position.
pub const LINK_LABELS: [&str; 6] = [
    "View Here",
    "See Image",
    "Check Photo",
    "Look Here",
    "View Picture",
    "See Here",
];

const PER_PAGE: usize = 8;
const MAX_SHOWN: usize = 6;

fn describe(photo: &Photo, query: &str) -> String {
    let raw = match photo.description.as_deref().map(str::trim) {
        Some(d) if d.chars().count() >= 5 => d.to_string(),
        _ => format!("Beautiful {}", query),
    };
    let text = truncate(&raw, 80);
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => text,
    }
}

pub fn format_photos(location: &str, query: &str, photos: &[Photo]) -> String {
    let entries: Vec<String> = photos
        .iter()
        .take(MAX_SHOWN)
        .enumerate()
        .map(|(i, photo)| {
            format!(
                "📸 **{}**\n   👤 By: {}\n   🔗 [{}]({})",
                describe(photo, query),
                photo.photographer,
                LINK_LABELS[i % LINK_LABELS.len()],
                photo.url
            )
        })
        .collect();
    format!(
        "📷 **Images for '{}':**\n\n{}\n\n💡 **Tip:** Click the links above to view high-quality images!",
        location,
        entries.join("\n\n")
    )
}

/// Search, retrying once with the last word of a multi-word query.
pub async fn search_photos(
    source: &dyn ImageSource,
    location: &str,
) -> Result<(String, Vec<Photo>), ToolError> {
    let photos = source.search(location, PER_PAGE).await?;
    if !photos.is_empty() {
        return Ok((location.to_string(), photos));
    }
    let words: Vec<&str> = location.split_whitespace().collect();
    if let [_, .., last] = words.as_slice() {
        let photos = source.search(last, PER_PAGE).await?;
        return Ok((last.to_string(), photos));
    }
    Ok((location.to_string(), photos))
}

pub async fn run(
    source: Option<&dyn ImageSource>,
    normalizer: &LocationNormalizer,
    location: &str,
) -> Result<String, ToolError> {
    let location = required(location, "Please provide a place to find images for.")?;
    let resolution = normalizer.normalize(location);
    let source = source.ok_or(ToolError::NotConfigured(IMAGE_SERVICE))?;

    let name = resolution.resolved_name.as_str();
    let (query, photos) = search_photos(source, name).await?;
    if photos.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No images found for '{}'. Try a different or more specific location name.",
            name
        )));
    }

    Ok(annotate(
        &resolution,
        format_photos(name, &query, &photos),
        |n| format!("🔍 Did you mean '{}'? Let me find images anyway.\n\n", n),
        |n| format!("📍 Images of {}:\n\n", n),
    ))
}
