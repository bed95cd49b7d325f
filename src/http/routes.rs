//! Account routes: signup, login, logout, validate, health.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::AppState;
use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::auth::session::{cleared_cookie, session_cookie};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::store::{StoreError, User};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: User,
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn ping_db(State(state): State<AppState>) -> Response {
    match state.store.ping() {
        Ok(()) => Json(json!({ "status": "db up" })).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "db down", "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("username, email and password are required".into()));
    }
    if req.password.len() > MAX_PASSWORD_BYTES {
        return Err(ApiError::Validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }

    let hash = state
        .passwords
        .hash(req.password.clone())
        .await
        .map_err(|err| ApiError::Validation(format!("failed to hash password: {err}")))?;

    // Every store failure on signup is reported as a bad request.
    let user = state.store.create_user(username, email, &hash).map_err(|err| match err {
        StoreError::Conflict(_) => ApiError::Validation("email is already registered".into()),
        other => ApiError::Validation(format!("failed to create user: {other}")),
    })?;

    info!(user_id = %user.id, "user signed up");
    Ok(Json(json!({ "status": "signup successful" })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let user = match state.store.find_user_by_email(req.email.trim()) {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::NotFound("user not found".into())),
        Err(err) => return Err(err.into()),
    };

    if !state.passwords.verify(req.password, user.password_hash.clone()).await {
        debug!(user_id = %user.id, "password mismatch");
        return Err(ApiError::Auth);
    }

    let token = state.tokens.issue(&user.id, &user.username, &user.email, state.session.ttl)?;
    info!(user_id = %user.id, "user logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.session))],
        Json(UserResponse { message: "Login Successful", user }),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, cleared_cookie(state.session))],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn validate(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
    Json(UserResponse { message: "User is authenticated", user })
}
