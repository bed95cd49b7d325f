//! Record store: users and rooms.

pub mod memory;
pub mod sqlite;

use serde::Serialize;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub room_code: String,
    pub host_id: String,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup and insert operations the auth and room handlers need.
///
/// Calls are short synchronous round trips; implementations must be safe to
/// share across request tasks.
pub trait RecordStore: Send + Sync {
    fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;
    fn find_user_by_id(&self, id: &str) -> Result<User, StoreError>;
    /// Fails with `Conflict` when the email is already registered.
    fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, StoreError>;
    fn find_room_by_code(&self, code: &str) -> Result<Room, StoreError>;
    /// Fails with `Conflict` when the code is already stored.
    fn create_room(&self, code: &str, host_id: &str) -> Result<Room, StoreError>;
    fn ping(&self) -> Result<(), StoreError>;
}

pub(crate) fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
