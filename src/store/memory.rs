//! In-process record store for tests and throwaway runs.

use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use super::{now_unix, RecordStore, Room, StoreError, User};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    // email -> user id
    emails: DashMap<String, String>,
    // room code -> room
    rooms: DashMap<String, Room>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admin hook: remove a user with their email and hosted rooms.
    pub fn delete_user(&self, id: &str) -> bool {
        let Some((_, user)) = self.users.remove(id) else { return false };
        self.emails.remove(&user.email);
        self.rooms.retain(|_, room| room.host_id != id);
        true
    }

    /// Admin hook: number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl RecordStore for MemoryStore {
    fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let id = self.emails.get(email).map(|id| id.clone()).ok_or(StoreError::NotFound)?;
        self.find_user_by_id(&id)
    }

    fn find_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.users.get(id).map(|u| u.clone()).ok_or(StoreError::NotFound)
    }

    fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, StoreError> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("email {email} already registered"))),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: now_unix(),
                };
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    fn find_room_by_code(&self, code: &str) -> Result<Room, StoreError> {
        self.rooms.get(code).map(|r| r.clone()).ok_or(StoreError::NotFound)
    }

    fn create_room(&self, code: &str, host_id: &str) -> Result<Room, StoreError> {
        if !self.users.contains_key(host_id) {
            return Err(StoreError::Conflict(format!("unknown host {host_id}")));
        }
        match self.rooms.entry(code.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("room code {code} already taken"))),
            Entry::Vacant(slot) => {
                let room = Room {
                    id: Uuid::new_v4().to_string(),
                    room_code: code.to_string(),
                    host_id: host_id.to_string(),
                    is_active: true,
                    created_at: now_unix(),
                };
                slot.insert(room.clone());
                Ok(room)
            }
        }
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_rejected_without_new_row() {
        let store = MemoryStore::new();
        store.create_user("a", "a@example.com", "h").unwrap();

        let err = store.create_user("b", "a@example.com", "h").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn delete_user_removes_lookups() {
        let store = MemoryStore::new();
        let user = store.create_user("a", "a@example.com", "h").unwrap();
        store.create_room("abc-DEF", &user.id).unwrap();

        assert!(store.delete_user(&user.id));
        assert_eq!(store.find_user_by_email("a@example.com"), Err(StoreError::NotFound));
        assert_eq!(store.find_room_by_code("abc-DEF"), Err(StoreError::NotFound));
        // email is free again
        assert!(store.create_user("a", "a@example.com", "h").is_ok());
    }

    #[test]
    fn room_code_conflict() {
        let store = MemoryStore::new();
        let user = store.create_user("a", "a@example.com", "h").unwrap();
        store.create_room("abc-DEF", &user.id).unwrap();

        assert!(matches!(store.create_room("abc-DEF", &user.id), Err(StoreError::Conflict(_))));
    }
}
