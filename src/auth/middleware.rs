use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;
use uuid::Uuid;

use crate::{account::dto::ErrorResponse, auth::jwt::JwtKeys};

/// Authenticated caller, identified by the public id carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Authorization header required",
            AuthError::InvalidFormat => "Invalid authorization format. Use: Bearer <token>",
            AuthError::InvalidToken => "Invalid or expired token",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: message.into(),
            }),
        )
            .into_response()
    }
}

/// Rejects the request unless it carries a valid bearer token, then stores
/// the caller as an [`AuthUser`] extension for the handler.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    // Expect "Bearer <token>"
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(reason = %e, "bearer token rejected");
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser(claims.sub));
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // only present when the route sits behind `require_auth`
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}
