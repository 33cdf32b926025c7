//! Actor extractor for Axum handlers.
//!
//! Reads the claims the `require_auth` middleware stored in the request
//! extensions and yields the acting user's id.

use crate::api::handlers::{AppError, CirclesState};
use crate::auth::jwt::Claims;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// The authenticated user on whose behalf a request runs.
///
/// ```rust,ignore
/// async fn my_handler(Actor(user_id): Actor) -> impl IntoResponse {
///     user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

impl Actor {
    fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        claims
            .user_id()
            .map(Actor)
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequestParts<CirclesState> for Actor {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &CirclesState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async {
            let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
                AppError::Unauthorized("Authentication required: no claims in request".to_string())
            })?;

            Self::from_claims(claims)
        }
    }
}
