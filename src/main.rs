use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use roomgate::{
    config::Config,
    http::{self, AppState},
    store::{RecordStore, SqliteStore},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = Config::from_env().context("loading configuration")?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;
    let store: Arc<dyn RecordStore> = Arc::new(store);
    info!(path = %config.database_path.display(), "database ready");

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {:?}", config.cors_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(12 * 3600));

    let app = http::router(AppState::from_config(store, &config))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!("listening on http://{}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
