//! Weather Sources
//!
//! Abstractions and implementations for current-conditions providers.

mod mock;
mod weatherstack;

pub use mock::MockWeatherSource;
pub use weatherstack::{WeatherstackClient, WeatherstackConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Units, WeatherReport};

/// Weather source trait (Strategy pattern)
///
/// Implemented by the upstream provider client, the normalization-server
/// client the agent uses, and a static mock.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions for a free-text location
    async fn current(&self, location: &str, units: Units) -> Result<WeatherReport>;

    /// Whether the source has what it needs (credentials, base URL) to answer
    fn is_configured(&self) -> bool;

    /// Source name
    fn name(&self) -> &str;
}
