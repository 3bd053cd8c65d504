//! Current Weather Tool
//!
//! The single tool the weather agent declares to the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_core::{tool::ParameterSchema, ArgumentError, Tool, ToolSchema};

use super::weather_lookup::lookup_text;
use crate::source::WeatherSource;

pub const TOOL_NAME: &str = "get_current_weather";

/// Validated arguments for `get_current_weather`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeatherQuery {
    pub location: String,
}

/// Tool for looking up current weather conditions
pub struct WeatherTool {
    source: Arc<dyn WeatherSource>,
}

impl WeatherTool {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &dyn WeatherSource {
        self.source.as_ref()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    type Args = WeatherQuery;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: TOOL_NAME.into(),
            description: "Retrieves current weather for a location. Call for any weather-related query.".into(),
            parameters: vec![ParameterSchema {
                name: "location".into(),
                param_type: "string".into(),
                description: "City or location name".into(),
                required: true,
            }],
        }
    }

    fn parse_arguments(&self, raw: &str) -> Result<WeatherQuery, ArgumentError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ArgumentError::Malformed(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| ArgumentError::Malformed("expected a JSON object".into()))?;

        let location = object
            .get("location")
            .ok_or(ArgumentError::Missing("location"))?
            .as_str()
            .ok_or_else(|| ArgumentError::Malformed("location must be a string".into()))?
            .trim();

        if location.is_empty() {
            return Err(ArgumentError::Empty("location"));
        }

        Ok(WeatherQuery {
            location: location.to_string(),
        })
    }

    fn progress_message(&self, args: &WeatherQuery) -> String {
        format!("Fetching weather data for {}...", args.location)
    }

    async fn execute(&self, args: &WeatherQuery) -> String {
        tracing::info!(location = %args.location, "Calling {}", TOOL_NAME);
        lookup_text(self.source.as_ref(), &args.location).await
    }
}
