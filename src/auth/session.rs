//! Session cookie and the authenticated-user extractor.

use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::token::SessionClaims;
use crate::error::ApiError;
use crate::http::AppState;
use crate::store::{StoreError, User};

pub const SESSION_COOKIE: &str = "Authorization";

/// Cookie attributes shared by login and logout.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub secure_cookies: bool,
}

pub fn session_cookie(token: &str, settings: SessionSettings) -> String {
    cookie(token, settings.ttl.as_secs(), settings.secure_cookies)
}

pub fn cleared_cookie(settings: SessionSettings) -> String {
    cookie("", 0, settings.secure_cookies)
}

fn cookie(value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// The session token from the request's `Cookie` headers, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// A request whose session token verified and whose user still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: SessionClaims,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Auth)?;
        let claims = state.tokens.validate(token).map_err(|err| {
            tracing::debug!(error = %err, "session token rejected");
            ApiError::Auth
        })?;

        // A valid signature is not enough: deleted users lose access at once.
        match state.store.find_user_by_id(&claims.sub) {
            Ok(user) => Ok(AuthUser { user, claims }),
            Err(StoreError::NotFound) => {
                tracing::debug!(user_id = %claims.sub, "session user no longer exists");
                Err(ApiError::Auth)
            }
            Err(err) => Err(err.into()),
        }
    }
}
