use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::TriagedConfig;
use crate::engine::ClassificationEngine;
use crate::error::TriagedError;
use crate::llm::ChatClient;
use crate::staff::{RawStaffRecord, StaffDirectory};

/// Process-wide state shared by all handlers.
///
/// The staff directory lives behind a lock as an `Arc` snapshot: refresh
/// swaps the whole `Arc`, and each request clones it exactly once, so no
/// request ever observes a half-updated directory.
pub struct AppState {
    pub engine: ClassificationEngine,
    pub client: ChatClient,
    pub directory: RwLock<Arc<StaffDirectory>>,
    pub http: reqwest::Client,
    pub staff_source_url: String,
}

impl AppState {
    pub fn new(config: &TriagedConfig) -> Self {
        Self {
            engine: ClassificationEngine::from_config(config),
            client: ChatClient::new(config.api_key.clone(), config.endpoint.clone()),
            directory: RwLock::new(Arc::new(StaffDirectory::sample())),
            http: reqwest::Client::new(),
            staff_source_url: config.staff_source_url.clone(),
        }
    }

    async fn snapshot(&self) -> Arc<StaffDirectory> {
        self.directory.read().await.clone()
    }
}

/// Build the application router. The handlers are thin controllers; all
/// decision logic lives in the engine.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/incidents/classify-summarize", post(classify_summarize))
        .route("/incidents/regenerate", post(regenerate))
        .route("/api/staff", get(refresh_staff))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct IncidentRequest {
    description: String,
}

#[derive(Debug, Deserialize)]
struct RegenerateRequest {
    summary: String,
    email: String,
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn classify_summarize(
    State(state): State<Arc<AppState>>,
    Json(incident): Json<IncidentRequest>,
) -> Result<Response, ApiError> {
    let length = incident.description.chars().count();
    if !(10..=2000).contains(&length) {
        return Err(ApiError::unprocessable(
            "description must be between 10 and 2000 characters",
        ));
    }

    let directory = state.snapshot().await;
    let response = state
        .engine
        .classify(&state.client, &directory, &incident.description)
        .await?;
    Ok(Json(response).into_response())
}

async fn regenerate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .engine
        .regenerate(&state.client, &request.summary, &request.email)
        .await?;
    Ok(Json(result).into_response())
}

/// Fetch the staff feed, rebuild the directory snapshot and swap it in.
async fn refresh_staff(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    if state.staff_source_url.is_empty() {
        return Err(ApiError::unprocessable("no staff_source_url configured"));
    }

    let response = state
        .http
        .get(&state.staff_source_url)
        .send()
        .await
        .map_err(|e| TriagedError::StaffRefresh(e.to_string()))?;
    if !response.status().is_success() {
        return Err(TriagedError::StaffRefresh(format!(
            "staff source returned status {}",
            response.status()
        ))
        .into());
    }

    let payload: serde_json::Value = response
        .json()
        .await
        .map_err(|e| TriagedError::StaffRefresh(e.to_string()))?;
    // The workflow system sometimes wraps the list in a "value" envelope.
    let records = match payload {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("value") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(TriagedError::StaffRefresh(
                    "unexpected staff feed format".into(),
                )
                .into());
            }
        },
        _ => {
            return Err(TriagedError::StaffRefresh("unexpected staff feed format".into()).into());
        }
    };

    let raw: Vec<RawStaffRecord> = records
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    let directory = StaffDirectory::from_raw(raw);
    if directory.is_empty() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "No staff data retrieved",
        ));
    }

    let count = directory.len();
    *state.directory.write().await = Arc::new(directory);
    info!(records = count, "staff directory refreshed");

    Ok(Json(json!({
        "message": "Staff data retrieved successfully",
        "records_retrieved": count,
        "status": "success",
    }))
    .into_response())
}

/// HTTP-facing error: a status code and a generic detail string. Internal
/// error contents are logged, never exposed.
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            detail: detail.to_string(),
        }
    }

    fn unprocessable(detail: &str) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl From<TriagedError> for ApiError {
    fn from(err: TriagedError) -> Self {
        error!(error = %err, "request failed");
        match err {
            TriagedError::MalformedCompletion(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "AI response is missing required fields.",
            ),
            TriagedError::Parse(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI response parsing failed",
            ),
            TriagedError::StaffRefresh(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                "Error retrieving staff data",
            ),
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Classification service error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"detail": self.detail}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = TriagedConfig {
            endpoint: "http://127.0.0.1:9/never-called".into(),
            ..Default::default()
        };
        Arc::new(AppState::new(&config))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn short_description_is_rejected() {
        let app = app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/incidents/classify-summarize")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"description": "short"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert!(json["detail"].as_str().unwrap().contains("10 and 2000"));
    }

    #[tokio::test]
    async fn oversized_description_is_rejected() {
        let app = app(test_state());
        let description = "x".repeat(2001);
        let body = serde_json::to_string(&json!({"description": description})).unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/incidents/classify-summarize")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn staff_refresh_without_source_url_is_rejected() {
        let app = app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/staff")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn api_error_hides_internals() {
        let err: ApiError = TriagedError::NoFallbackStaff {
            department: "Admin".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "Classification service error");
    }
}
