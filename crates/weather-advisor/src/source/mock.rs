//! Mock Weather Source
//!
//! For testing and demo purposes. Returns static conditions for a handful of
//! cities, in Fahrenheit.

use async_trait::async_trait;

use super::WeatherSource;
use crate::error::{Result, WeatherError};
use crate::model::{Units, WeatherReport};

/// Mock weather source with static conditions
#[derive(Default)]
pub struct MockWeatherSource;

impl MockWeatherSource {
    pub const fn new() -> Self {
        Self
    }

    /// (name, temp, feels_like, humidity, wind, dir, description, uv, visibility, cloud)
    #[allow(clippy::type_complexity)]
    fn conditions(
        location: &str,
    ) -> Option<(&'static str, i32, i32, i32, i32, &'static str, &'static str, i32, i32, i32)> {
        match location.trim().to_lowercase().as_str() {
            "austin" => Some(("Austin", 72, 70, 45, 10, "S", "Sunny", 6, 10, 5)),
            "london" => Some(("London", 54, 51, 82, 14, "WSW", "Light rain", 1, 6, 90)),
            "tokyo" => Some(("Tokyo", 68, 68, 60, 7, "E", "Partly cloudy", 4, 10, 40)),
            "phoenix" => Some(("Phoenix", 108, 104, 12, 8, "W", "Clear", 10, 10, 0)),
            "chicago" => Some(("Chicago", 18, 4, 70, 28, "NW", "Blowing snow", 1, 2, 100)),
            "miami" => Some(("Miami", 91, 106, 78, 12, "SE", "Humid", 11, 10, 20)),
            _ => None,
        }
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn current(&self, location: &str, _units: Units) -> Result<WeatherReport> {
        let (name, temperature, feels_like, humidity, wind_speed, dir, description, uv_index, visibility, cloud_cover) =
            Self::conditions(location)
                .ok_or_else(|| WeatherError::LocationNotFound(location.to_string()))?;

        Ok(WeatherReport {
            location: name.into(),
            temperature,
            feels_like,
            humidity,
            wind_speed,
            wind_direction: dir.into(),
            weather_description: description.into(),
            uv_index,
            visibility,
            cloud_cover,
        })
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "MockWeather"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_lookup_is_case_insensitive() {
        let source = MockWeatherSource::new();

        let report = source.current("  AUSTIN ", Units::Fahrenheit).await.unwrap();
        assert_eq!(report.location, "Austin");
        assert_eq!(report.temperature, 72);
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let source = MockWeatherSource::new();
        let result = source.current("Atlantis", Units::Fahrenheit).await;
        assert!(matches!(result, Err(WeatherError::LocationNotFound(l)) if l == "Atlantis"));
    }
}
