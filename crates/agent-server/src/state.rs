//! Application State

use std::sync::Arc;

use agent_core::Agent;
use weather_advisor::tools::WeatherTool;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Weather agent (None if the model is not configured)
    pub agent: Option<Arc<Agent<WeatherTool>>>,

    /// Model deployment name, reported by `/health`
    pub model: String,

    /// Weather normalization server URL, reported by `/health`
    pub mcp_url: String,
}
