//! Auth middleware for Axum routes.
//!
//! Validates JWT Bearer tokens and injects Claims into request extensions.
//! Implements deny-by-default: if `auth_config` is None, all requests are rejected.

use crate::api::handlers::{AppError, CirclesState};
use crate::auth::jwt::decode_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Middleware that requires a valid JWT Bearer token.
///
/// # Behavior
/// 1. If `auth_config` is `None` → 403 Forbidden (deny-by-default)
/// 2. Extract `Authorization: Bearer <token>` header → 401 if missing
/// 3. Validate JWT with the configured secret → 401 if invalid/expired
/// 4. Inject `Claims` into request extensions for the `Actor` extractor
pub async fn require_auth(
    State(state): State<CirclesState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured: access denied".to_string())
    })?;

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?;

    let claims = decode_jwt(token, &auth_config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized(format!("Invalid token: {}", e))
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::ServerState;
    use crate::auth::jwt::{encode_jwt, Claims};
    use crate::auth::Actor;
    use crate::test_helpers::{mock_app_state, test_auth_config, TEST_JWT_SECRET};
    use crate::AuthConfig;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn test_app(auth_config: Option<AuthConfig>) -> Router {
        let app_state = mock_app_state();
        let state = Arc::new(ServerState {
            social: app_state.social,
            auth_config,
        });

        async fn whoami(Actor(user_id): Actor) -> String {
            user_id.to_string()
        }

        Router::new()
            .route("/test", get(whoami))
            .layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    fn get_with(token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/test");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_no_auth_config_returns_403() {
        let token = encode_jwt(uuid::Uuid::new_v4(), TEST_JWT_SECRET, 3600).unwrap();
        let resp = test_app(None).oneshot(get_with(Some(&token))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_no_header_returns_401() {
        let resp = test_app(Some(test_auth_config()))
            .oneshot(get_with(None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_basic_scheme_returns_401() {
        let req = HttpRequest::builder()
            .uri("/test")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let resp = test_app(Some(test_auth_config())).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401() {
        let resp = test_app(Some(test_auth_config()))
            .oneshot(get_with(Some("invalid.token.here")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_returns_401() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            name: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .unwrap();

        let resp = test_app(Some(test_auth_config()))
            .oneshot(get_with(Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_yields_actor() {
        let user_id = uuid::Uuid::new_v4();
        let token = encode_jwt(user_id, TEST_JWT_SECRET, 3600).unwrap();

        let resp = test_app(Some(test_auth_config()))
            .oneshot(get_with(Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), user_id.to_string());
    }
}
