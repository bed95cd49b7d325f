//! Tracing initialization.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Used when RUST_LOG is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,roomgate=info,tower_http=info,axum=info";

/// Install the global subscriber. RUST_LOG overrides the default filter,
/// e.g. `RUST_LOG=debug,tower_http=info` to see session rejections.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
