use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse},
        extractors::RequestContext,
    },
    errors::AuthError,
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let user = state
        .auth
        .register(&payload.email, payload.password, &payload.name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let outcome = state.auth.login(&payload.email, payload.password).await?;
    Ok(Json(LoginResponse {
        access_token: outcome.token,
        token_type: "Bearer",
        expires_in: outcome.expires_in,
        user: outcome.user,
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.auth.profile(ctx.subject).await?;
    Ok(Json(user))
}
