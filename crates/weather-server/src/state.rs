//! Application State

use std::sync::Arc;

use weather_advisor::WeatherSource;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Upstream weather provider (Weatherstack, or the mock for demos)
    pub source: Arc<dyn WeatherSource>,
}
