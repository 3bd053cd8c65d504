//! HTTP Handlers

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use weather_advisor::{Units, WeatherError, WeatherReport};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub location: String,
    #[serde(default)]
    pub units: Units,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_key_configured: bool,
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

/// Status and envelope text for each lookup failure
fn error_response(err: &WeatherError) -> ApiError {
    match err {
        WeatherError::NotConfigured => api_error(StatusCode::SERVICE_UNAVAILABLE, err.user_message()),
        WeatherError::Timeout => api_error(StatusCode::BAD_GATEWAY, "Weather service timed out."),
        WeatherError::Upstream(_) | WeatherError::Unreachable(_) | WeatherError::InvalidResponse(_) => {
            api_error(StatusCode::BAD_GATEWAY, "External weather service returned an error.")
        }
        WeatherError::LocationNotFound(_) => api_error(StatusCode::NOT_FOUND, "Location not found."),
        WeatherError::Provider(info) => api_error(StatusCode::BAD_REQUEST, info.clone()),
        WeatherError::Config(_) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        api_key_configured: state.source.is_configured(),
    })
}

/// Current conditions in the flat normalized shape
pub async fn current_weather(
    State(state): State<AppState>,
    params: Result<Query<WeatherParams>, QueryRejection>,
) -> Result<Json<WeatherReport>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected weather query");
        api_error(StatusCode::BAD_REQUEST, "Invalid request parameters.")
    })?;

    let location = params.location.trim();
    if location.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid request parameters."));
    }

    tracing::info!(location = %location, units = params.units.as_str(), "Incoming weather request");

    state
        .source
        .current(location, params.units)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use weather_advisor::{MockWeatherSource, WeatherSource, WeatherstackClient, WeatherstackConfig};

    use super::*;
    use crate::app;

    fn mock_app() -> Router {
        app(AppState {
            source: Arc::new(MockWeatherSource::new()),
        })
    }

    fn weatherstack_app(base_url: String, api_key: Option<&str>) -> Router {
        let client = WeatherstackClient::new(WeatherstackConfig {
            base_url,
            api_key: api_key.map(Into::into),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        let source: Arc<dyn WeatherSource> = Arc::new(client);
        app(AppState { source })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn upstream_answering(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(template).mount(&server).await;
        server
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(mock_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "api_key_configured": true}));

        let server = MockServer::start().await;
        let (_, body) = get(weatherstack_app(server.uri(), None), "/health").await;
        assert_eq!(body["api_key_configured"], false);
    }

    #[tokio::test]
    async fn test_weather_success() {
        let (status, body) = get(mock_app(), "/weather?location=Austin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"], "Austin");
        assert_eq!(body["feels_like"], 70);
        assert_eq!(body.as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_invalid_parameters() {
        for uri in [
            "/weather",
            "/weather?location=",
            "/weather?location=%20%20",
            "/weather?location=Austin&units=k",
        ] {
            let (status, body) = get(mock_app(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({"error": "Invalid request parameters."}));
        }
    }

    #[tokio::test]
    async fn test_location_not_found() {
        let (status, body) = get(mock_app(), "/weather?location=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Location not found."}));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let server = MockServer::start().await;
        let (status, body) = get(weatherstack_app(server.uri(), None), "/weather?location=Austin").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({"error": "Weather service is unavailable: API key not configured."})
        );
    }

    #[tokio::test]
    async fn test_upstream_http_error() {
        let server = upstream_answering(ResponseTemplate::new(500)).await;
        let (status, body) = get(weatherstack_app(server.uri(), Some("k")), "/weather?location=Austin").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "External weather service returned an error."}));
    }

    #[tokio::test]
    async fn test_upstream_timeout() {
        let server =
            upstream_answering(ResponseTemplate::new(200).set_delay(Duration::from_secs(2))).await;
        let (status, body) = get(weatherstack_app(server.uri(), Some("k")), "/weather?location=Austin").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"error": "Weather service timed out."}));
    }

    #[tokio::test]
    async fn test_upstream_error_codes() {
        let server = upstream_answering(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": 615, "info": "Your API request failed."}
        })))
        .await;
        let (status, _) = get(weatherstack_app(server.uri(), Some("k")), "/weather?location=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let server = upstream_answering(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": 104, "info": "Usage limit reached."}
        })))
        .await;
        let (status, body) = get(weatherstack_app(server.uri(), Some("k")), "/weather?location=Austin").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Usage limit reached."}));
    }
}
