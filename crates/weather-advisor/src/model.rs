//! Domain Models
//!
//! The flat current-conditions report shared by the normalization server and
//! the agent's lookup client, and the tool outcome the model reads.

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Current conditions for one location, in the flat normalized shape
///
/// Every field is required on the wire; a body missing any of them is not a
/// report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Resolved location name
    pub location: String,

    /// Temperature in the requested units
    pub temperature: i32,

    /// Apparent temperature
    pub feels_like: i32,

    /// Relative humidity, percent
    pub humidity: i32,

    /// Wind speed in the requested units
    pub wind_speed: i32,

    /// Compass direction (e.g. "SSW")
    pub wind_direction: String,

    /// Human-readable conditions (e.g. "Partly cloudy")
    pub weather_description: String,

    pub uv_index: i32,

    /// Visibility distance in the requested units
    pub visibility: i32,

    /// Cloud cover, percent
    pub cloud_cover: i32,
}

/// Measurement units understood by the upstream provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    #[default]
    #[serde(rename = "f")]
    Fahrenheit,
    #[serde(rename = "m")]
    Metric,
    #[serde(rename = "s")]
    Scientific,
}

impl Units {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fahrenheit => "f",
            Self::Metric => "m",
            Self::Scientific => "s",
        }
    }
}

/// Result of one weather lookup as the model sees it.
///
/// Serializes to either the flat report or `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupOutcome {
    Failure { error: String },
    Success(WeatherReport),
}

impl LookupOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn from_result(result: Result<WeatherReport, WeatherError>) -> Self {
        match result {
            Ok(report) => Self::Success(report),
            Err(e) => Self::failure(e.user_message()),
        }
    }

    /// JSON text for the tool-result turn
    pub fn to_tool_text(&self) -> String {
        match serde_json::to_string(self) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize weather outcome");
                serde_json::json!({ "error": "Weather data could not be encoded." }).to_string()
            }
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
