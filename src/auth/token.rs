//! Signed session tokens: HS256 JWTs carrying the user id and profile.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The only accepted `alg` header value.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Expiry, unix seconds.
    pub exp: i64,
}

// Only `alg` is read before the signature check.
#[derive(Deserialize)]
struct AlgHeader {
    alg: String,
}

#[derive(thiserror::Error, Debug)]
pub enum IssuanceError {
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("token ttl must be at least one second")]
    InvalidTtl,
    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("unexpected signing algorithm {0:?}")]
    WrongAlgorithm(String),
    #[error("token expired")]
    Expired,
}

/// Issues and validates session tokens under a single symmetric secret.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("secret", &"<redacted>").finish()
    }
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an injected clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        Self { secret: secret.into(), validation }
    }

    pub fn issue(&self, subject: &str, username: &str, email: &str, ttl: Duration) -> Result<String, IssuanceError> {
        self.issue_at(subject, username, email, ttl, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        username: &str,
        email: &str,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Result<String, IssuanceError> {
        if self.secret.is_empty() {
            return Err(IssuanceError::MissingSecret);
        }
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(|secs| now.unix_timestamp().checked_add(secs))
            .ok_or(IssuanceError::InvalidTtl)?;

        let claims = SessionClaims {
            sub: subject.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            exp,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?;
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, ValidationError> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Checks shape, algorithm, signature and expiry, in that order.
    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<SessionClaims, ValidationError> {
        let mut parts = token.split('.');
        let (Some(h), Some(_), Some(_), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
            return Err(ValidationError::Malformed);
        };

        // `none` and unknown algorithms do not parse as a jsonwebtoken header,
        // so the name is checked here first.
        let header = URL_SAFE_NO_PAD.decode(h).map_err(|_| ValidationError::Malformed)?;
        let header: AlgHeader = serde_json::from_slice(&header).map_err(|_| ValidationError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(ValidationError::WrongAlgorithm(header.alg));
        }

        // Nothing is accepted under an empty key.
        if self.secret.is_empty() {
            return Err(ValidationError::BadSignature);
        }

        let key = DecodingKey::from_secret(&self.secret);
        let data = jsonwebtoken::decode::<SessionClaims>(token, &key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::InvalidSignature => ValidationError::BadSignature,
                ErrorKind::InvalidAlgorithm => ValidationError::WrongAlgorithm(header.alg.clone()),
                _ => ValidationError::Malformed,
            }
        })?;

        if now.unix_timestamp() > data.claims.exp {
            return Err(ValidationError::Expired);
        }
        Ok(data.claims)
    }
}
