//! Configuration from environment variables.

use std::{
    env,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use anyhow::{bail, Context};

use crate::auth::session::SessionSettings;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "roomgate.db";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_SESSION_TTL_DAYS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub jwt_secret: Vec<u8>,
    pub database_path: PathBuf,
    /// `APP_ENV=production`: cookies are marked `Secure`.
    pub production: bool,
    pub cors_origin: String,
    pub session_ttl: Duration,
    pub request_timeout: Duration,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Reads the process environment.
    ///
    /// - `PORT` / `APP_PORT` (8080)
    /// - `JWT_SECRET`, or `JWT_SECRET_HEX` for binary secrets (required)
    /// - `DATABASE_PATH` (`roomgate.db`; `:memory:` for a throwaway database)
    /// - `APP_ENV`, `CORS_ORIGIN`, `SESSION_TTL_DAYS`, `REQUEST_TIMEOUT_SECS`, `BCRYPT_COST`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match get("PORT").or_else(|| get("APP_PORT")) {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid port {p:?}"))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = match (get("JWT_SECRET_HEX"), get("JWT_SECRET")) {
            (Some(hex), _) => hex::decode(hex.trim()).context("JWT_SECRET_HEX is not valid hex")?,
            (None, Some(secret)) => secret.into_bytes(),
            (None, None) => bail!("JWT_SECRET must be set"),
        };
        if jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let bcrypt_cost = parse_or(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        let ttl_days: u64 = parse_or(&get, "SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;
        if ttl_days == 0 {
            bail!("SESSION_TTL_DAYS must be positive");
        }

        let timeout_secs: u64 = parse_or(&get, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be positive");
        }

        Ok(Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            jwt_secret,
            database_path: get("DATABASE_PATH").map(PathBuf::from).unwrap_or_else(|| DEFAULT_DATABASE.into()),
            production: get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            session_ttl: Duration::from_secs(ttl_days * 24 * 3600),
            request_timeout: Duration::from_secs(timeout_secs),
            bcrypt_cost,
        })
    }

    pub fn session(&self) -> SessionSettings {
        SessionSettings { ttl: self.session_ttl, secure_cookies: self.production }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid {key} {raw:?}")),
        None => Ok(default),
    }
}
