//! Tool System
//!
//! A tool declares its schema for function calling, validates the raw
//! argument payload the model produced, and executes. Execution never fails:
//! a tool reports problems inside the text it hands back to the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID assigned by the model, echoed on the tool result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Raw JSON argument payload, exactly as the model produced it
    pub arguments: String,
}

/// Why a tool call's arguments were rejected
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// Payload is not a JSON object of the expected shape
    #[error("invalid argument payload: {0}")]
    Malformed(String),

    /// A required parameter is absent
    #[error("missing required parameter: {0}")]
    Missing(&'static str),

    /// A parameter is present but empty
    #[error("parameter must not be empty: {0}")]
    Empty(&'static str),
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render the parameters as a JSON Schema object
    pub fn parameters_json(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.param_type,
                        "description": p.description,
                    }),
                )
            })
            .collect();

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Validated arguments
    type Args: Send + Sync;

    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Parse and validate the model's raw argument payload
    fn parse_arguments(&self, raw: &str) -> Result<Self::Args, ArgumentError>;

    /// Progress line shown to the user while the tool runs
    fn progress_message(&self, args: &Self::Args) -> String;

    /// Execute the tool; the returned text is fed back to the model verbatim
    async fn execute(&self, args: &Self::Args) -> String;
}
