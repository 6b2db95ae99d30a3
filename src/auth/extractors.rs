use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{auth::services::Subject, errors::AuthError, state::AppState};

/// Per-request context filled in by [`require_bearer`] before the handler runs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub subject: Subject,
}

/// Guard for bearer-protected routes.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let subject = {
        let token = bearer_token(request.headers())?;
        state.auth.authenticate(token).map_err(|e| {
            warn!(reason = %e, uri = %request.uri(), "bearer authentication failed");
            e
        })?
    };
    request.extensions_mut().insert(RequestContext { subject });
    Ok(next.run(request).await)
}

/// Reads `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or(AuthError::TokenInvalid)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present on routes mounted behind `require_bearer`.
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
