//! Room routes. All of them require a session.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::store::{Room, StoreError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCodeResponse {
    pub room_code: String,
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub room: Room,
}

pub async fn new_room_code(State(state): State<AppState>, _auth: AuthUser) -> Result<Json<RoomCodeResponse>, ApiError> {
    let room_code = state.room_codes.generate()?;
    Ok(Json(RoomCodeResponse { room_code }))
}

/// Reserve a fresh code and store an active room hosted by the caller.
pub async fn create_room(State(state): State<AppState>, auth: AuthUser) -> Result<Json<RoomResponse>, ApiError> {
    let code = state.room_codes.generate()?;
    // The UNIQUE constraint settles races with a concurrent insert.
    let room = state.store.create_room(&code, &auth.user.id)?;
    info!(room_code = %room.room_code, host_id = %room.host_id, "room created");
    Ok(Json(RoomResponse { room }))
}

pub async fn get_room(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, ApiError> {
    match state.store.find_room_by_code(&code) {
        Ok(room) => Ok(Json(RoomResponse { room })),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("room not found".into())),
        Err(err) => Err(err.into()),
    }
}
