use crate::configuration::{DatabaseSettings, DatabaseType};
use crate::db::errors::DBError;
use crate::db::in_memory::InMemoryDB;
use crate::db::relational::RelationalDB;
use crate::errors::AppErrors;
use sea_orm::Database as SeaOrmDB;

pub mod contact_message;
mod errors;
pub mod in_memory;
pub mod relational;
pub mod rules;
pub mod traits;
pub mod user;

pub use contact_message::{ContactMessage, NewContactMessage};
pub use errors::DBError as DatabaseError;
pub use user::{Credentials, NewUser, Registration, User, UserId};

#[derive(Debug)]
pub enum Database {
    InMemory(Box<InMemoryDB>),
    Relational(RelationalDB),
}

impl Database {
    pub async fn try_from(settings: &DatabaseSettings) -> Result<Self, AppErrors> {
        settings.is_valid()?;
        match settings.db_type {
            DatabaseType::InMemory => {
                let db = match &settings.file_path {
                    Some(file_path) => InMemoryDB::try_from(file_path.to_owned())?,
                    None => InMemoryDB::default(),
                };
                Ok(Self::InMemory(Box::new(db)))
            }
            DatabaseType::Relational => {
                let connection_settings = settings.relational_connection()?;
                let connection = SeaOrmDB::connect(connection_settings)
                    .await
                    .map_err(|e| AppErrors::DatabaseError(DBError::Relational(e)))?;
                let db = RelationalDB::init(connection);
                db.ensure_schema().await?;
                Ok(Self::Relational(db))
            }
        }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DBError> {
        match self {
            Database::InMemory(db) => db.create_user(new_user),
            Database::Relational(db) => db.create_user(new_user).await,
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DBError> {
        match self {
            Database::InMemory(db) => db.find_user_by_email(email),
            Database::Relational(db) => db.find_user_by_email(email).await,
        }
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, DBError> {
        match self {
            Database::InMemory(db) => db.get_user(id),
            Database::Relational(db) => db.get_user(id).await,
        }
    }

    /// Stores one message. Identical payloads are stored as separate rows.
    pub async fn register_message(
        &self,
        user_id: Option<UserId>,
        message: NewContactMessage,
    ) -> Result<ContactMessage, DBError> {
        match self {
            Database::InMemory(db) => db.register_message(user_id, message),
            Database::Relational(db) => db.register_message(user_id, message).await,
        }
    }

    pub async fn messages_for_user(&self, user_id: UserId) -> Result<Vec<ContactMessage>, DBError> {
        match self {
            Database::InMemory(db) => db.messages_for_user(user_id),
            Database::Relational(db) => db.messages_for_user(user_id).await,
        }
    }

    pub async fn all_messages(&self) -> Result<Vec<ContactMessage>, DBError> {
        match self {
            Database::InMemory(db) => db.all_messages(),
            Database::Relational(db) => db.all_messages().await,
        }
    }
}
