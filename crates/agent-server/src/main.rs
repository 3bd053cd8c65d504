//! Weather Agent HTTP Server
//!
//! Axum-based server exposing the two-round weather agent as a JSON endpoint
//! and as a server-sent event stream.

mod config;
mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Agent, AgentBuilder, LlmProvider};
use agent_runtime::{ChatCompletionsConfig, ChatCompletionsProvider};
use weather_advisor::{
    tools::{WeatherLookupClient, WeatherTool},
    WEATHER_ASSISTANT_PROMPT,
};

use crate::config::ServerConfig;
use crate::handlers::{chat_handler, chat_stream_handler, handle_panic, health_check};
use crate::state::AppState;

/// Build the router
pub fn app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the model client and the weather agent around it
async fn build_agent(config: &ServerConfig) -> anyhow::Result<Agent<WeatherTool>> {
    let model_config = ChatCompletionsConfig::from_env()?;
    let model_timeout = Duration::from_secs(model_config.timeout_secs);
    let provider = ChatCompletionsProvider::from_config(model_config)?;

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to model endpoint"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Model endpoint did not answer the health probe");
            tracing::warn!("  Requests will fail with 503 until it is reachable");
        }
    }

    let model = provider.deployment().to_string();
    let lookup = WeatherLookupClient::new(config.mcp_url.clone())?;

    let agent = AgentBuilder::new()
        .provider(Arc::new(provider))
        .tool(WeatherTool::new(Arc::new(lookup)))
        .system_prompt(WEATHER_ASSISTANT_PROMPT)
        .model(model)
        .model_timeout(model_timeout)
        .build()?;

    Ok(agent)
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

    let config = ServerConfig::from_env();

    let agent = match build_agent(&config).await {
        Ok(agent) => {
            tracing::info!("✓ Chat client initialized");
            Some(Arc::new(agent))
        }
        Err(e) => {
            tracing::warn!("⚠ Failed to initialize chat client: {}", e);
            tracing::warn!("  Set PROJECT_ENDPOINT, AZURE_AI_API_KEY and MODEL_DEPLOYMENT_NAME in .env");
            None
        }
    };

    tracing::info!("  Model:   {}", config.model);
    tracing::info!("  MCP URL: {}", config.mcp_url);

    // Build application state
    let state = AppState {
        agent,
        model: config.model.clone(),
        mcp_url: config.mcp_url.clone(),
    };

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 agent-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  POST /chat         - Send message");
    tracing::info!("  POST /chat/stream  - Server-sent event stream");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Chat client released");
    Ok(())
}
