//! Error Types for Weather Lookups

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeatherError>;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Provider rejected the query; carries its own explanation
    #[error("Weather provider error: {0}")]
    Provider(String),

    #[error("Weather service timed out")]
    Timeout,

    #[error("Weather service unreachable: {0}")]
    Unreachable(String),

    /// Upstream answered with a non-success HTTP status
    #[error("Upstream returned HTTP {0}")]
    Upstream(u16),

    #[error("Invalid response from weather service: {0}")]
    InvalidResponse(String),

    #[error("Weather API key not configured")]
    NotConfigured,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WeatherError {
    /// Classify a transport failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Unreachable(err.to_string())
        }
    }

    /// Text handed back to the model inside the tool result
    pub fn user_message(&self) -> String {
        match self {
            Self::LocationNotFound(location) => format!("Location '{location}' was not found."),
            Self::Provider(detail) => detail.clone(),
            Self::Timeout => "Weather service timed out.".into(),
            Self::Unreachable(_) => "Weather service is unreachable.".into(),
            Self::Upstream(_) => "External weather service returned an error.".into(),
            Self::InvalidResponse(_) => "Weather service returned an unreadable response.".into(),
            Self::NotConfigured => "Weather service is unavailable: API key not configured.".into(),
            Self::Config(_) => "Weather service is misconfigured.".into(),
        }
    }
}
