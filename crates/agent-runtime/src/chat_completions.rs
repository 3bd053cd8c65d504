//! Chat Completions LLM Provider
//!
//! Implementation of `LlmProvider` for Azure OpenAI deployments and other
//! OpenAI-compatible `/chat/completions` endpoints, including function calling.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How requests are addressed and authenticated
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiStyle {
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=…`
    /// with an `api-key` header
    Azure { api_version: String },

    /// `{endpoint}/chat/completions` with a bearer token and `model` in the body
    OpenAi,
}

/// Provider configuration
#[derive(Clone, Debug)]
pub struct ChatCompletionsConfig {
    /// Resource endpoint (Azure) or API base URL (OpenAI-compatible)
    pub endpoint: String,

    /// API key
    pub api_key: String,

    /// Deployment (Azure) or model name
    pub deployment: String,

    /// Addressing scheme
    pub api_style: ApiStyle,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

pub const DEFAULT_API_VERSION: &str = "2025-01-01-preview";

impl ChatCompletionsConfig {
    /// Read `PROJECT_ENDPOINT`, `AZURE_AI_API_KEY`, `MODEL_DEPLOYMENT_NAME`,
    /// `AZURE_API_VERSION`, `MODEL_API_STYLE` and `MODEL_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let endpoint = required_env("PROJECT_ENDPOINT")?;
        let api_key = required_env("AZURE_AI_API_KEY")?;
        let deployment = required_env("MODEL_DEPLOYMENT_NAME")?;

        let api_style = match std::env::var("MODEL_API_STYLE").as_deref() {
            Ok("openai") => ApiStyle::OpenAi,
            _ => ApiStyle::Azure {
                api_version: std::env::var("AZURE_API_VERSION")
                    .unwrap_or_else(|_| DEFAULT_API_VERSION.into()),
            },
        };

        let timeout_secs = std::env::var("MODEL_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            endpoint,
            api_key,
            deployment,
            api_style,
            timeout_secs,
        })
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AgentError::Config(format!("{name} is not set")))
}

/// Chat-completions LLM provider
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    config: ChatCompletionsConfig,
}

impl ChatCompletionsProvider {
    /// Create from configuration
    pub fn from_config(mut config: ChatCompletionsConfig) -> Result<Self> {
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(ChatCompletionsConfig::from_env()?)
    }

    /// Deployment or model name requests go to
    pub fn deployment(&self) -> &str {
        &self.config.deployment
    }

    fn completions_url(&self) -> String {
        match &self.config.api_style {
            ApiStyle::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.config.endpoint, self.config.deployment, api_version
            ),
            ApiStyle::OpenAi => format!("{}/chat/completions", self.config.endpoint),
        }
    }

    fn models_url(&self) -> String {
        match &self.config.api_style {
            ApiStyle::Azure { api_version } => format!(
                "{}/openai/models?api-version={}",
                self.config.endpoint, api_version
            ),
            ApiStyle::OpenAi => format!("{}/models", self.config.endpoint),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_style {
            ApiStyle::Azure { .. } => request.header("api-key", &self.config.api_key),
            ApiStyle::OpenAi => request.bearer_auth(&self.config.api_key),
        }
    }

    /// Convert agent messages to wire format
    fn convert_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| {
                let tool_calls: Vec<ApiToolCall> = m
                    .tool_calls
                    .iter()
                    .map(|tc| ApiToolCall {
                        id: tc.id.clone(),
                        kind: "function".into(),
                        function: ApiFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect();

                // Assistant tool-call turns carry null content on the wire
                let content = if m.content.is_empty() && !tool_calls.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                };

                ApiMessage {
                    role: m.role.to_string(),
                    content,
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolSchema]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters_json(),
                    }
                })
            })
            .collect()
    }

    fn build_body(&self, messages: &[Message], tools: &[ToolSchema], opts: &GenerationOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "messages": Self::convert_messages(messages),
            "temperature": opts.temperature,
        });

        if self.config.api_style == ApiStyle::OpenAi {
            let model = if opts.model.is_empty() {
                &self.config.deployment
            } else {
                &opts.model
            };
            body["model"] = serde_json::json!(model);
        }

        if let Some(max_tokens) = opts.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::convert_tools(tools));
        }

        body
    }

    /// Convert a wire response to an agent completion
    fn convert_completion(response: ApiResponse, fallback_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("No choices in response".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: response.model.unwrap_or_else(|| fallback_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(parse_finish_reason),
        })
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolUse,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Error,
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        match self.config.api_style {
            ApiStyle::Azure { .. } => "azure-openai",
            ApiStyle::OpenAi => "openai-compatible",
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let request = self.authorize(self.client.get(self.models_url()));
        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Model endpoint health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = self.build_body(messages, tools, options);

        tracing::debug!(
            provider = self.name(),
            deployment = %self.config.deployment,
            messages = messages.len(),
            tools = tools.len(),
            "Sending completion request"
        );

        let response = self
            .authorize(self.client.post(self.completions_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ModelUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "Provider returned error");
            return Err(AgentError::Provider(format!("HTTP {status}: {error_body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse response: {e}")))?;

        Self::convert_completion(api_response, &self.config.deployment)
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: ApiFunction,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
