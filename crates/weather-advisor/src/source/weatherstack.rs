//! Weatherstack Client
//!
//! Talks to the Weatherstack "current" API and flattens its nested payload
//! into a [`WeatherReport`]. Weatherstack answers HTTP 200 even for failures;
//! those are signalled with `success: false` in the body.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::WeatherSource;
use crate::error::{Result, WeatherError};
use crate::model::{Units, WeatherReport};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherstack.com/current";

/// Error codes Weatherstack uses for an unknown or unparseable location
const LOCATION_NOT_FOUND_CODES: [i64; 2] = [601, 615];

const UNKNOWN_PROVIDER_ERROR: &str = "Unknown error from weather service.";

/// Connection settings for Weatherstack
#[derive(Clone, Debug)]
pub struct WeatherstackConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for WeatherstackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl WeatherstackConfig {
    /// Reads `WEATHERSTACK_API_KEY`. An empty key counts as missing.
    pub fn from_env() -> Self {
        let api_key = std::env::var("WEATHERSTACK_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            api_key,
            ..Self::default()
        }
    }
}

pub struct WeatherstackClient {
    client: reqwest::Client,
    config: WeatherstackConfig,
}

impl WeatherstackClient {
    pub fn new(config: WeatherstackConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WeatherError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(WeatherstackConfig::from_env())
    }

    fn flatten(body: StackResponse) -> WeatherReport {
        let current = body.current;
        WeatherReport {
            location: body.location.name,
            temperature: current.temperature,
            feels_like: current.feelslike,
            humidity: current.humidity,
            wind_speed: current.wind_speed,
            wind_direction: current.wind_dir,
            weather_description: current
                .weather_descriptions
                .into_iter()
                .next()
                .unwrap_or_default(),
            uv_index: current.uv_index,
            visibility: current.visibility,
            cloud_cover: current.cloudcover,
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherstackClient {
    async fn current(&self, location: &str, units: Units) -> Result<WeatherReport> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(WeatherError::NotConfigured)?;

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("access_key", api_key),
                ("query", location),
                ("units", units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let err = WeatherError::from_transport(&e);
                tracing::error!(location = %location, error = %err, "Weatherstack request failed");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(location = %location, status = %status, "Weatherstack HTTP error");
            return Err(WeatherError::Upstream(status.as_u16()));
        }

        let body: StackResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::InvalidResponse(e.to_string()))?;

        if body.success == Some(false) {
            let error = body.error.unwrap_or_default();
            if LOCATION_NOT_FOUND_CODES.contains(&error.code) {
                tracing::warn!(location = %location, code = error.code, "Location not found");
                return Err(WeatherError::LocationNotFound(location.to_string()));
            }

            let info = error.info.unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.into());
            tracing::error!(location = %location, code = error.code, info = %info, "Weatherstack error");
            return Err(WeatherError::Provider(info));
        }

        Ok(Self::flatten(body))
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn name(&self) -> &str {
        "Weatherstack"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StackResponse {
    success: Option<bool>,
    error: Option<StackError>,
    #[serde(default)]
    location: StackLocation,
    #[serde(default)]
    current: StackCurrent,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StackError {
    code: i64,
    info: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StackLocation {
    name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StackCurrent {
    temperature: i32,
    feelslike: i32,
    humidity: i32,
    wind_speed: i32,
    wind_dir: String,
    weather_descriptions: Vec<String>,
    uv_index: i32,
    visibility: i32,
    cloudcover: i32,
}
