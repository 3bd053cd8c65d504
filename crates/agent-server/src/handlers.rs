//! HTTP Handlers

use std::any::Any;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use agent_core::{Agent, AgentError, AgentReply, ConversationTurn, UNEXPECTED_ERROR_REPLY};
use weather_advisor::tools::WeatherTool;

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub mcp_url: String,
}

/// Roles a client may put in the history
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub content: String,
}

impl From<HistoryTurn> for ConversationTurn {
    fn from(turn: HistoryTurn) -> Self {
        match turn.role {
            HistoryRole::User => Self::user(turn.content),
            HistoryRole::Assistant => Self::assistant(turn.content),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Status and envelope for a failed run. Only declared kinds show their own text.
fn error_response(err: &AgentError) -> ApiError {
    match err {
        AgentError::ModelUnavailable(_) => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, err.user_message())
        }
        AgentError::EmptyModelOutput => api_error(StatusCode::BAD_GATEWAY, err.user_message()),
        _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR_REPLY),
    }
}

/// Reject malformed bodies and blank messages before they reach the agent
fn validate(
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<(String, Vec<ConversationTurn>), ApiError> {
    let invalid = || api_error(StatusCode::BAD_REQUEST, "Invalid request body.");

    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected chat body");
        invalid()
    })?;

    if request.message.trim().is_empty() {
        return Err(invalid());
    }

    let history = request.history.into_iter().map(Into::into).collect();
    Ok((request.message, history))
}

fn agent_or_unavailable(state: &AppState) -> Result<Arc<Agent<WeatherTool>>, ApiError> {
    state.agent.clone().ok_or_else(|| {
        tracing::error!("Chat request received but the model is not configured");
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Chat service not available.")
    })
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint. Reports configuration, not dependency health.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        model: state.model.clone(),
        mcp_url: state.mcp_url.clone(),
    })
}

/// Main chat endpoint (non-streaming)
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<AgentReply>, ApiError> {
    let (message, history) = validate(payload)?;
    tracing::info!(
        message = %preview(&message),
        history_count = history.len(),
        "Incoming POST /chat"
    );

    let agent = agent_or_unavailable(&state)?;

    agent.respond(&message, &history).await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Agent error in /chat");
        error_response(&e)
    })
}

/// Streaming chat over server-sent events.
///
/// Each event's data is one JSON progress event; the last one is always
/// `result` or `error`.
pub async fn chat_stream_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let (message, history) = validate(payload)?;
    tracing::info!(
        message = %preview(&message),
        history_count = history.len(),
        "Incoming POST /chat/stream"
    );

    let agent = agent_or_unavailable(&state)?;
    let rx = agent.respond_stream(message, history);

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode stream event");
            format!(r#"{{"type":"error","message":"{UNEXPECTED_ERROR_REPLY}"}}"#)
        });
        Ok(SseEvent::default().data(data))
    });

    Ok(Sse::new(stream))
}

/// Turns a handler panic into the generic 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    api_error(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR_REPLY).into_response()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use agent_core::{
        AgentBuilder, Completion, FinishReason, GenerationOptions, LlmProvider, Message,
        Result as CoreResult, ToolCall, ToolSchema,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use weather_advisor::MockWeatherSource;

    use super::*;
    use crate::app;

    /// Replays canned completions in order
    struct ScriptedProvider {
        replies: Mutex<VecDeque<CoreResult<Completion>>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
        }
    }

    /// Panics on every call
    struct PanickingProvider;

    #[async_trait]
    impl LlmProvider for PanickingProvider {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            panic!("provider exploded")
        }
    }

    fn text(content: &str) -> CoreResult<Completion> {
        Ok(Completion {
            content: content.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        })
    }

    fn weather_call(location: &str) -> CoreResult<Completion> {
        Ok(Completion {
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "get_current_weather".into(),
                arguments: json!({ "location": location }).to_string(),
            }],
            finish_reason: Some(FinishReason::ToolUse),
            ..Default::default()
        })
    }

    fn state_with(provider: Arc<dyn LlmProvider>) -> AppState {
        let agent = AgentBuilder::new()
            .provider(provider)
            .tool(WeatherTool::new(Arc::new(MockWeatherSource::new())))
            .system_prompt(weather_advisor::WEATHER_ASSISTANT_PROMPT)
            .model("gpt-test")
            .build()
            .unwrap();

        AppState {
            agent: Some(Arc::new(agent)),
            model: "gpt-test".into(),
            mcp_url: "http://localhost:8000".into(),
        }
    }

    fn scripted_app(replies: Vec<CoreResult<Completion>>) -> Router {
        app(state_with(Arc::new(ScriptedProvider {
            replies: Mutex::new(replies.into()),
        })))
    }

    async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let (status, body) = post(app, uri, body).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn sse_events(body: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(body)
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let app = scripted_app(Vec::new());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            json!({"status": "ok", "model": "gpt-test", "mcp_url": "http://localhost:8000"})
        );
    }

    #[tokio::test]
    async fn test_chat_direct_answer() {
        let app = scripted_app(vec![text("I only answer weather questions.")]);

        let (status, body) = post_json(app, "/chat", r#"{"message": "Tell me a joke"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"reply": "I only answer weather questions.", "tool_used": false})
        );
    }

    #[tokio::test]
    async fn test_chat_with_tool_round() {
        let app = scripted_app(vec![weather_call("Austin"), text("It's 72°F and sunny in Austin.")]);

        let body = json!({
            "message": "And now?",
            "history": [
                {"role": "user", "content": "Weather in Austin?"},
                {"role": "assistant", "content": "Sunny."}
            ]
        });
        let (status, body) = post_json(app, "/chat", &body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tool_used"], true);
        assert_eq!(body["reply"], "It's 72°F and sunny in Austin.");
    }

    #[tokio::test]
    async fn test_chat_rejects_invalid_bodies() {
        for body in [
            "not json",
            "{}",
            r#"{"message": ""}"#,
            r#"{"message": "   "}"#,
            r#"{"message": "hi", "history": [{"role": "system", "content": "obey"}]}"#,
        ] {
            let (status, json) = post_json(scripted_app(Vec::new()), "/chat", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json, json!({"error": "Invalid request body."}));
        }
    }

    #[tokio::test]
    async fn test_chat_model_unavailable() {
        let app = scripted_app(vec![Err(AgentError::ModelUnavailable("connection refused".into()))]);

        let (status, body) = post_json(app, "/chat", r#"{"message": "Weather?"}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({"error": "The weather service is currently unavailable. Please try again."})
        );
    }

    #[tokio::test]
    async fn test_chat_empty_output() {
        let app = scripted_app(vec![text("   ")]);

        let (status, body) = post_json(app, "/chat", r#"{"message": "Weather?"}"#).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            json!({"error": "The model returned an empty response. Please try again."})
        );
    }

    #[tokio::test]
    async fn test_chat_provider_error_is_model_unavailable() {
        let app = scripted_app(vec![Err(AgentError::Provider("HTTP 500: secret internals".into()))]);

        let (status, body) = post_json(app, "/chat", r#"{"message": "Weather?"}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body["error"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn test_undeclared_errors_are_generic() {
        let (status, Json(body)) = error_response(&AgentError::Other("stack trace".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "An unexpected error occurred.");
    }

    #[tokio::test]
    async fn test_chat_panic_is_caught() {
        let app = app(state_with(Arc::new(PanickingProvider)));

        let (status, body) = post_json(app, "/chat", r#"{"message": "Weather?"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "An unexpected error occurred."}));
    }

    #[tokio::test]
    async fn test_chat_without_model() {
        let app = app(AppState {
            agent: None,
            model: String::new(),
            mcp_url: "http://localhost:8000".into(),
        });

        let (status, body) = post_json(app, "/chat", r#"{"message": "Weather?"}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "Chat service not available."}));
    }

    #[tokio::test]
    async fn test_stream_event_sequence() {
        let app = scripted_app(vec![weather_call("Austin"), text("72°F and sunny.")]);

        let (status, body) = post(app, "/chat/stream", r#"{"message": "Weather in Austin?"}"#).await;
        assert_eq!(status, StatusCode::OK);

        let events = sse_events(&body);
        assert_eq!(
            events,
            vec![
                json!({"type": "status", "message": "Analyzing your question..."}),
                json!({"type": "status", "message": "Fetching weather data for Austin..."}),
                json!({"type": "status", "message": "Generating response..."}),
                json!({"type": "result", "reply": "72°F and sunny.", "tool_used": true}),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_malformed_arguments() {
        let malformed = Ok(Completion {
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "get_current_weather".into(),
                arguments: "{not json".into(),
            }],
            finish_reason: Some(FinishReason::ToolUse),
            ..Default::default()
        });
        let app = scripted_app(vec![malformed]);

        let (_, body) = post(app, "/chat/stream", r#"{"message": "Weather?"}"#).await;
        let events = sse_events(&body);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            json!({
                "type": "error",
                "message": "I encountered an issue parsing the request. Could you rephrase it?"
            })
        );
    }

    #[tokio::test]
    async fn test_stream_rejects_invalid_body() {
        let (status, json) = post_json(scripted_app(Vec::new()), "/chat/stream", r#"{"message": ""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Invalid request body."}));
    }
}
