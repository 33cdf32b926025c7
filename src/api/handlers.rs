//! Shared handler state, health check and error mapping

use crate::social::{SocialError, SocialService, Transition};
use crate::{AppState, AuthConfig};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Shared server state
pub struct ServerState {
    pub social: Arc<SocialService>,
    /// Auth config; None means deny-by-default
    pub auth_config: Option<AuthConfig>,
}

impl From<&AppState> for ServerState {
    fn from(state: &AppState) -> Self {
        Self {
            social: state.social.clone(),
            auth_config: state.config.auth_config.clone(),
        }
    }
}

/// State handed to every handler
pub type CirclesState = Arc<ServerState>;

/// Handler result alias
pub type ApiResult<T> = Result<T, AppError>;

// ============================================================================
// Health
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub neo4j: String,
}

/// Health check handler; verifies connectivity to the graph store.
///
/// Returns 200 + `"ok"` when Neo4j answers, 503 + `"unhealthy"` otherwise.
pub async fn health(State(state): State<CirclesState>) -> (StatusCode, Json<HealthResponse>) {
    let neo4j_ok = state
        .social
        .store()
        .health_check()
        .await
        .unwrap_or(false);

    let (http_status, status) = if neo4j_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            neo4j: if neo4j_ok {
                "connected".to_string()
            } else {
                "disconnected".to_string()
            },
        }),
    )
}

// ============================================================================
// Shared responses
// ============================================================================

/// Result of a state-machine call; `changed` is false for a repeated call
#[derive(Debug, Serialize)]
pub struct TransitionResponse<T> {
    pub changed: bool,
    pub request: T,
}

impl<T> From<Transition<T>> for TransitionResponse<T> {
    fn from(transition: Transition<T>) -> Self {
        Self {
            changed: transition.is_applied(),
            request: transition.into_inner(),
        }
    }
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    PreconditionFailed(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PreconditionFailed(msg) => (StatusCode::PRECONDITION_FAILED, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<SocialError> for AppError {
    fn from(err: SocialError) -> Self {
        let message = err.to_string();
        match err {
            SocialError::InvalidArgument(_)
            | SocialError::UnknownRequest(_)
            | SocialError::NotParticipant { .. } => AppError::BadRequest(message),
            SocialError::NotFound(_) => AppError::NotFound(message),
            SocialError::Conflict(_) => AppError::Conflict(message),
            SocialError::PreconditionFailed { .. } => AppError::PreconditionFailed(message),
            SocialError::MissingFriendEdge { .. } => AppError::Internal(anyhow::anyhow!(message)),
            SocialError::Store(e) => AppError::Internal(e),
        }
    }
}
