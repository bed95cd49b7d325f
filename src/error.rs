//! Request-boundary errors and their `{code, message}` body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::token::IssuanceError;
use crate::room::code::ExhaustionError;
use crate::store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    /// Missing, invalid or expired session, unknown user, wrong password.
    #[error("unauthorized")]
    Auth,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Detail is logged, never sent.
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { code: status.as_u16(), message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("unable to read body: {}", rejection.body_text()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("record not found".into()),
            StoreError::Conflict(detail) => ApiError::Conflict(detail),
            StoreError::Unavailable(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<IssuanceError> for ApiError {
    fn from(err: IssuanceError) -> Self {
        ApiError::Internal(format!("failed to create token: {err}"))
    }
}

impl From<ExhaustionError> for ApiError {
    fn from(err: ExhaustionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn uniform_body() {
        let (status, json) = body(ApiError::NotFound("user not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, serde_json::json!({ "code": 404, "message": "user not found" }));
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let (status, json) = body(ApiError::Internal("disk I/O error at /var/db".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "internal server error");
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(ApiError::from(StoreError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StoreError::Conflict("dup".into())).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
