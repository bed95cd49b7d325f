//! SQLite-backed record store.
//!
//! Tables:
//! - `users`: id, username, email (unique), password, created_at
//! - `rooms`: id, room_code (unique), host_id, is_active, created_at

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{now_unix, RecordStore, Room, StoreError, User};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS rooms (
        id TEXT PRIMARY KEY,
        room_code TEXT NOT NULL UNIQUE,
        host_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_rooms_host ON rooms(host_id);";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. `:memory:` gives a private
    /// in-memory database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Admin hook: remove a user and, through the foreign key, the rooms
    /// they host. Outstanding tokens for the user stop working at once.
    pub fn delete_user(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Admin hook: number of registered users.
    pub fn user_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn user_where(&self, column: &str, value: &str) -> Result<User, StoreError> {
        let conn = self.conn.lock();
        let sql = format!("SELECT id, username, email, password, created_at FROM users WHERE {column} = ?1");
        conn.query_row(&sql, params![value], |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?
        .ok_or(StoreError::NotFound)
    }
}

impl RecordStore for SqliteStore {
    fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.user_where("email", email)
    }

    fn find_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.user_where("id", id)
    }

    fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now_unix(),
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, username, email, password, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.username, user.email, user.password_hash, user.created_at],
        )?;
        Ok(user)
    }

    fn find_room_by_code(&self, code: &str) -> Result<Room, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, room_code, host_id, is_active, created_at FROM rooms WHERE room_code = ?1",
            params![code],
            |row| {
                Ok(Room {
                    id: row.get(0)?,
                    room_code: row.get(1)?,
                    host_id: row.get(2)?,
                    is_active: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn create_room(&self, code: &str, host_id: &str) -> Result<Room, StoreError> {
        let room = Room {
            id: Uuid::new_v4().to_string(),
            room_code: code.to_string(),
            host_id: host_id.to_string(),
            is_active: true,
            created_at: now_unix(),
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO rooms (id, room_code, host_id, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![room.id, room.room_code, room.host_id, room.is_active, room.created_at],
        )?;
        Ok(room)
    }

    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(&tmp.path().join("roomgate.db")).unwrap();
        (tmp, store)
    }

    #[test]
    fn create_and_find_user() {
        let (_tmp, store) = test_store();

        let created = store.create_user("alice", "alice@example.com", "$2b$hash").unwrap();
        let by_email = store.find_user_by_email("alice@example.com").unwrap();
        let by_id = store.find_user_by_id(&created.id).unwrap();

        assert_eq!(by_email, created);
        assert_eq!(by_id, created);
        assert_eq!(by_id.password_hash, "$2b$hash");
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let (_tmp, store) = test_store();

        store.create_user("alice", "alice@example.com", "h1").unwrap();
        let err = store.create_user("alice2", "alice@example.com", "h2").unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn missing_records_are_not_found() {
        let (_tmp, store) = test_store();

        assert_eq!(store.find_user_by_email("nobody@example.com"), Err(StoreError::NotFound));
        assert_eq!(store.find_user_by_id("nope"), Err(StoreError::NotFound));
        assert_eq!(store.find_room_by_code("abc-DEF"), Err(StoreError::NotFound));
    }

    #[test]
    fn room_codes_are_unique() {
        let (_tmp, store) = test_store();
        let host = store.create_user("host", "host@example.com", "h").unwrap();

        let room = store.create_room("abc-DEF", &host.id).unwrap();
        assert!(room.is_active);
        assert_eq!(store.find_room_by_code("abc-DEF").unwrap(), room);

        let err = store.create_room("abc-DEF", &host.id).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn deleting_user_drops_hosted_rooms() {
        let (_tmp, store) = test_store();
        let host = store.create_user("host", "host@example.com", "h").unwrap();
        store.create_room("xyz-ABC", &host.id).unwrap();

        assert!(store.delete_user(&host.id).unwrap());
        assert_eq!(store.find_user_by_id(&host.id), Err(StoreError::NotFound));
        assert_eq!(store.find_room_by_code("xyz-ABC"), Err(StoreError::NotFound));
        assert!(!store.delete_user(&host.id).unwrap());
    }

    #[test]
    fn data_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roomgate.db");
        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.create_user("bob", "bob@example.com", "h").unwrap().id
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.find_user_by_email("bob@example.com").unwrap().id, id);
    }

    #[test]
    fn ping_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.ping().is_ok());
    }
}
