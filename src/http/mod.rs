//! HTTP surface: shared state and routing.

pub mod rooms;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::{session::SessionSettings, PasswordHasher, TokenService};
use crate::config::Config;
use crate::room::RoomCodeGenerator;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
    pub room_codes: Arc<RoomCodeGenerator>,
    pub session: SessionSettings,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tokens: TokenService,
        passwords: PasswordHasher,
        session: SessionSettings,
    ) -> Self {
        Self {
            room_codes: Arc::new(RoomCodeGenerator::new(store.clone())),
            store,
            tokens: Arc::new(tokens),
            passwords,
            session,
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self::new(
            store,
            TokenService::new(config.jwt_secret.clone()),
            PasswordHasher::new(config.bcrypt_cost),
            config.session(),
        )
    }
}

/// All routes, without middleware layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/ping-db", get(routes::ping_db))
        .route("/signup", post(routes::signup))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/validate", get(routes::validate))
        .route("/new-room-code", get(rooms::new_room_code))
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/:code", get(rooms::get_room))
        .with_state(state)
}
