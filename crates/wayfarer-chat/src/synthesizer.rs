//! Final answer composition from collected tool results.

use tracing::debug;

use wayfarer_tools::tools::imagery::LINK_LABELS;

use crate::enrich::Enrichment;
use crate::error::ChatError;
use crate::intent::Intent;
use crate::llm::LanguageModel;
use crate::message::Message;
use crate::prompts::{synthesis_prompt, SYSTEM_PROMPT};

/// Label every image link carries in a final reply.
pub const IMAGE_LINK_LABEL: &str = "[🔗 See Images]";

/// Rewrite the rotating image link labels to the single clickable label.
pub fn decorate_links(text: &str) -> String {
    LINK_LABELS.iter().fold(text.to_string(), |acc, label| {
        acc.replace(&format!("[{}]", label), IMAGE_LINK_LABEL)
    })
}

/// `{tool}: {text}` blocks in order, then the enrichments.
pub fn combine_results(tool_results: &[(String, String)], extra: &[Enrichment]) -> String {
    tool_results
        .iter()
        .map(|(tool, text)| format!("{}: {}", tool, text))
        .chain(extra.iter().map(Enrichment::render))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One tool-free model call over the collected results.
pub async fn synthesize(
    model: &dyn LanguageModel,
    query: &str,
    intent: Intent,
    combined: &str,
) -> Result<String, ChatError> {
    let prompt = synthesis_prompt(query, combined, intent);
    debug!(%intent, prompt_chars = prompt.len(), "Synthesizing reply");
    let messages = [Message::system(SYSTEM_PROMPT), Message::user(prompt)];
    let reply = model.complete(&messages).await?;
    Ok(decorate_links(reply.trim()))
}
