//! LLM collaborator seam.
//!
//! Each agent is bound to exactly one [`LlmClient`]. When tools are offered
//! the client may emit at most the tool calls declared in the request; the
//! network enforces that by looking tools up on the calling agent only.
//!
//! [`AnthropicClient`] implements the seam over the Messages API. Model
//! choice and prompt wording live with the callers, not here.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use liftline_core::config::LlmConfig;

const ANTHROPIC_API_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm transport failure: {0}")]
    Transport(String),
    #[error("llm returned an unusable response: {0}")]
    Malformed(String),
    #[error("llm is not configured: {0}")]
    NotConfigured(String),
}

/// JSON schema of one tool offered to the model.
#[derive(Clone, Debug, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One model invocation: a system role, a rendered prompt, and the tools
/// the calling agent declares.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub tools: Vec<ToolSchema>,
    pub max_tokens: u32,
}

/// What came back: plain text or a structured tool call.
#[derive(Clone, Debug, PartialEq)]
pub enum LlmReply {
    Text(String),
    ToolCall { name: String, arguments: serde_json::Value },
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<LlmReply, LlmError>;
}

/// Messages API client for Anthropic models.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiToolDef>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDef {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { name: String, input: serde_json::Value },
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::NotConfigured("llm.api_key is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self { client, api_key, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    fn into_reply(response: MessagesResponse) -> Result<LlmReply, LlmError> {
        // A tool_use block wins over surrounding text: the text is the
        // model thinking out loud, the tool call is the decision.
        for block in &response.content {
            if let ContentBlock::ToolUse { name, input } = block {
                return Ok(LlmReply::ToolCall { name: name.clone(), arguments: input.clone() });
            }
        }

        let text: String = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(LlmError::Malformed("response contained no text and no tool call".into()));
        }
        Ok(LlmReply::Text(text))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: ChatRequest) -> Result<LlmReply, LlmError> {
        let body = MessagesRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            system: request.system,
            messages: vec![ApiMessage { role: "user", content: request.prompt }],
            tools: request
                .tools
                .into_iter()
                .map(|tool| ApiToolDef {
                    name: tool.name,
                    description: tool.description,
                    input_schema: tool.parameters,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(LlmError::Transport(format!("status {status}: {detail}")));
        }

        let payload: MessagesResponse =
            response.json().await.map_err(|error| LlmError::Malformed(error.to_string()))?;
        Self::into_reply(payload)
    }
}
