//! Language-model client.
//!
//! The orchestrator only sees [`LanguageModel`]; [`ChatCompletionsClient`]
//! speaks the OpenAI-compatible `/chat/completions` protocol (Groq by
//! default).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use wayfarer_core::config::LlmConfig;

use crate::error::ChatError;
use crate::message::{Message, ToolRequest};

/// What the model produced for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolRequest>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(calls: Vec<ToolRequest>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
        }
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Answer with tools bound; the reply may request tool calls.
    async fn decide(&self, messages: &[Message], tools: &[Value]) -> Result<ModelReply, ChatError>;

    /// Answer with no tools bound.
    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError>;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolRequest>>,
}

// =============================================================================
// Client
// =============================================================================

/// OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Llm(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(
        &self,
        messages: &[Message],
        tools: Option<&[Value]>,
    ) -> Result<ModelReply, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::NotConfigured("GROQ_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            tools: tools.filter(|t| !t.is_empty()),
            tool_choice: tools.filter(|t| !t.is_empty()).map(|_| "auto"),
        };
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Calling language model"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::LlmTimeout(self.timeout_secs)
                } else {
                    ChatError::Llm(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), detail = %detail, "Language model returned an error");
            return Err(ChatError::Llm(format!("HTTP {} from model endpoint", status)));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Llm(format!("failed to parse response: {}", e)))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ChatError::Llm("response contained no choices".to_string()))?;

        Ok(ModelReply {
            content: message.content.filter(|c| !c.trim().is_empty()),
            tool_calls: message.tool_calls.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    async fn decide(&self, messages: &[Message], tools: &[Value]) -> Result<ModelReply, ChatError> {
        self.request(messages, Some(tools)).await
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError> {
        let reply = self.request(messages, None).await?;
        reply
            .content
            .ok_or_else(|| ChatError::Llm("model returned an empty answer".to_string()))
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
