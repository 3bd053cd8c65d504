//! Weather Lookup Client
//!
//! Client for the weather normalization server. `lookup` never fails outward:
//! every failure comes back as `{"error": "..."}` text the model can read.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, WeatherError};
use crate::model::{LookupOutcome, Units, WeatherReport};
use crate::source::WeatherSource;

pub const DEFAULT_MCP_URL: &str = "http://localhost:8000";

/// Fixed upper bound on one lookup
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

const UNKNOWN_PROVIDER_ERROR: &str = "Unknown error from weather service.";

/// Run one lookup against any source and render the outcome as tool text.
///
/// Every failure branch is logged at error level before being folded into
/// the returned text.
pub async fn lookup_text(source: &dyn WeatherSource, location: &str) -> String {
    let result = source.current(location, Units::default()).await;

    match &result {
        Ok(report) => tracing::info!(
            location = %location,
            resolved = %report.location,
            source = source.name(),
            "Weather lookup succeeded"
        ),
        Err(e) => tracing::error!(
            location = %location,
            source = source.name(),
            error = %e,
            "Weather lookup failed"
        ),
    }

    LookupOutcome::from_result(result).to_tool_text()
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for `GET {base}/weather?location=...`
pub struct WeatherLookupClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherLookupClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Reads `MCP_SERVER_URL`, defaulting to the local normalization server
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("MCP_SERVER_URL").unwrap_or_else(|_| DEFAULT_MCP_URL.into());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up current conditions and render them as tool-result text
    pub async fn lookup(&self, location: &str) -> String {
        lookup_text(self, location).await
    }
}

#[async_trait]
impl WeatherSource for WeatherLookupClient {
    async fn current(&self, location: &str, units: Units) -> Result<WeatherReport> {
        let url = format!("{}/weather", self.base_url);

        // The server answers in Fahrenheit unless told otherwise
        let mut request = self.client.get(&url).query(&[("location", location)]);
        if units != Units::Fahrenheit {
            request = request.query(&[("units", units.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WeatherError::from_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<WeatherReport>()
                .await
                .map_err(|e| WeatherError::InvalidResponse(e.to_string()));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(WeatherError::LocationNotFound(location.to_string()));
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.into());

        tracing::debug!(status = %status, detail = %detail, "Normalization server returned an error");
        Err(WeatherError::Provider(detail))
    }

    fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    fn name(&self) -> &str {
        "WeatherLookup"
    }
}
