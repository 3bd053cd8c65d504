//! Weather Normalization Server
//!
//! Axum wrapper around the Weatherstack "current" API. Keeps the provider key
//! server-side and answers with the flat report the agent's lookup client
//! expects.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_advisor::{MockWeatherSource, WeatherSource, WeatherstackClient};

use crate::handlers::{current_weather, health_check};
use crate::state::AppState;

/// Build the router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/weather", get(current_weather))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pick the weather source; `WEATHER_SOURCE=mock` serves static demo data
fn weather_source() -> anyhow::Result<Arc<dyn WeatherSource>> {
    if std::env::var("WEATHER_SOURCE").is_ok_and(|s| s.eq_ignore_ascii_case("mock")) {
        tracing::warn!("⚠ Serving mock weather data (WEATHER_SOURCE=mock)");
        return Ok(Arc::new(MockWeatherSource::new()));
    }

    let client = WeatherstackClient::from_env()?;
    if !client.is_configured() {
        tracing::warn!("⚠ WEATHERSTACK_API_KEY is not set");
        tracing::warn!("  /weather will return 503 until the key is configured");
    }
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let source = weather_source()?;
    tracing::info!("✓ Weather source: {}", source.name());

    let state = AppState { source };

    // Start server
    let port = std::env::var("MCP_PORT").unwrap_or_else(|_| "8000".into());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🌦  weather-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health   - Health check");
    tracing::info!("  GET  /weather  - Current conditions (?location=&units=f|m|s)");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
