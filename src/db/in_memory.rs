use crate::db::errors::{DBError, InMemoryError};
use crate::db::user::normalize_email;
use crate::db::{ContactMessage, NewContactMessage, NewUser, User, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Layout of the optional JSON seed file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FileStructure {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub contact_messages: Vec<ContactMessage>,
}

#[derive(Debug, Default)]
pub struct InMemoryDB {
    pub users: RwLock<Vec<User>>,
    pub contact_messages: RwLock<Vec<ContactMessage>>,
}

impl TryFrom<String> for InMemoryDB {
    type Error = DBError;

    fn try_from(file_path: String) -> Result<Self, Self::Error> {
        let data = fs::read_to_string(file_path)
            .map_err(|e| DBError::InMemoryError(InMemoryError::IoError(e)))?;
        let db: FileStructure = serde_json::from_str(&data)
            .map_err(|e| DBError::InMemoryError(InMemoryError::SerdeError(e)))?;
        Ok(Self {
            users: RwLock::new(db.users),
            contact_messages: RwLock::new(db.contact_messages),
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, DBError> {
    lock.read().map_err(|_| DBError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, DBError> {
    lock.write().map_err(|_| DBError::LockPoisoned)
}

impl InMemoryDB {
    pub fn create_user(&self, new_user: NewUser) -> Result<User, DBError> {
        let mut users = write(&self.users)?;
        let email = normalize_email(&new_user.email);
        if users.iter().any(|user| normalize_email(&user.email) == email) {
            return Err(DBError::DuplicateEmail);
        }
        let id = users.iter().map(|user| user.id.0).max().unwrap_or(0) + 1;
        let user = User {
            id: UserId(id),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email,
            birthdate: new_user.birthdate,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DBError> {
        let email = normalize_email(email);
        let users = read(&self.users)?;
        Ok(users
            .iter()
            .find(|user| normalize_email(&user.email) == email)
            .cloned())
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>, DBError> {
        let users = read(&self.users)?;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    pub fn register_message(
        &self,
        user_id: Option<UserId>,
        message: NewContactMessage,
    ) -> Result<ContactMessage, DBError> {
        if let Some(id) = user_id {
            if self.get_user(id)?.is_none() {
                return Err(DBError::UnknownUser);
            }
        }
        let mut messages = write(&self.contact_messages)?;
        let id = messages.iter().map(|msg| msg.id).max().unwrap_or(0) + 1;
        let stored = ContactMessage {
            id,
            user_id,
            name: message.name,
            email: message.email,
            message: message.message,
            created_at: Utc::now(),
        };
        messages.push(stored.clone());
        Ok(stored)
    }

    pub fn messages_for_user(&self, user_id: UserId) -> Result<Vec<ContactMessage>, DBError> {
        let messages = read(&self.contact_messages)?;
        Ok(messages
            .iter()
            .filter(|msg| msg.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    pub fn all_messages(&self) -> Result<Vec<ContactMessage>, DBError> {
        let messages = read(&self.contact_messages)?;
        Ok(messages.clone())
    }
}
