use std::future::Future;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    account::{
        dto::{AuthResponse, ProfileResponse, SignInRequest, SignUpRequest, UpdateProfileRequest},
        services::AccountError,
    },
    auth::middleware::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/signup", post(sign_up))
        .route("/account/signin", post(sign_in))
}

/// Routes that must sit behind the auth gate.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/account/profile",
        get(get_profile).put(update_profile).delete(close_account),
    )
}

// Service work runs on its own task so that a client hanging up cannot
// abandon a write halfway; the result is simply dropped in that case.
async fn detached<T, F>(work: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AccountError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let accounts = state.accounts.clone();
    let res = detached(async move { accounts.sign_up(payload).await }).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let accounts = state.accounts.clone();
    let res = detached(async move { accounts.sign_in(payload).await }).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    Ok(Json(state.accounts.profile(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let accounts = state.accounts.clone();
    let res = detached(async move { accounts.update_profile(user_id, payload).await }).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn close_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, AppError> {
    let accounts = state.accounts.clone();
    detached(async move { accounts.close_account(user_id).await }).await?;
    Ok(StatusCode::NO_CONTENT)
}
