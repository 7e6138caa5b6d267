use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::prompts::{
    build_proposal_prompt, build_tone_prompt, PROPOSAL_SYSTEM_PROMPT, TONE_SYSTEM_PROMPT,
};
use crate::stages::{ProposalRequest, ProposalSource, ToneClassifier, ToneVerdict};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Create config from environment variables
    ///
    /// `CLIPSMITH_MODEL` overrides the default model.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        let model = std::env::var("CLIPSMITH_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        Ok(Self::new(api_key, model))
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

/// Anthropic API client used as proposal source and tone classifier
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send a message forcing a single tool call and return the tool input
    pub async fn send_with_tool(&self, system: &str, user: &str, tool: Tool) -> Result<serde_json::Value> {
        let tool_name = tool.name.clone();
        let request = AnthropicToolRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            tools: vec![tool],
            tool_choice: Some(ToolChoice {
                choice_type: "tool".to_string(),
                name: tool_name.clone(),
            }),
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        // Find the tool_use content block
        response
            .content
            .into_iter()
            .find(|c| c.content_type == "tool_use" && c.name.as_deref() == Some(tool_name.as_str()))
            .and_then(|c| c.input)
            .with_context(|| format!("No {} tool_use response found", tool_name))
    }
}

#[async_trait]
impl ProposalSource for AnthropicClient {
    async fn propose(&self, request: &ProposalRequest) -> Result<serde_json::Value> {
        let prompt = build_proposal_prompt(request);
        self.send_with_tool(PROPOSAL_SYSTEM_PROMPT, &prompt, moments_tool())
            .await
    }
}

#[async_trait]
impl ToneClassifier for AnthropicClient {
    async fn classify(&self, text: &str, tone: &str) -> Result<ToneVerdict> {
        let prompt = build_tone_prompt(text, tone);
        let input = self
            .send_with_tool(TONE_SYSTEM_PROMPT, &prompt, verdict_tool())
            .await?;
        serde_json::from_value(input).context("Failed to parse tool input as ToneVerdict")
    }
}

fn moments_tool() -> Tool {
    Tool {
        name: "submit_moments".to_string(),
        description: "Submit the clip-worthy moments found in this window".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "moments": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "start": {"type": "number", "description": "Start time in seconds"},
                            "end": {"type": "number", "description": "End time in seconds"},
                            "rating": {"type": "number", "minimum": 0, "maximum": 10},
                            "reason": {"type": "string"},
                            "quote": {"type": "string", "description": "Verbatim line from the transcript"}
                        },
                        "required": ["start", "end", "rating", "reason", "quote"]
                    }
                }
            },
            "required": ["moments"]
        }),
    }
}

fn verdict_tool() -> Tool {
    Tool {
        name: "submit_verdict".to_string(),
        description: "Submit whether the excerpt matches the target tone".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "match": {"type": "boolean"}
            },
            "required": ["match"]
        }),
    }
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}
