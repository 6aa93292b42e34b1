pub mod entities;

use chrono::Utc;
use entities::{prelude::*, *};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Schema, Set, SqlErr,
};

use crate::db::errors::DBError;
use crate::db::user::normalize_email;
use crate::db::{ContactMessage, NewContactMessage, NewUser, User, UserId};

/// A concurrent registration can slip past the lookup in `create_user`;
/// the unique index on `users.email` catches it.
fn user_insert_error(err: DbErr) -> DBError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DBError::DuplicateEmail,
        _ => DBError::Relational(err),
    }
}

#[derive(Debug, Default)]
pub struct RelationalDB {
    pub connection: DatabaseConnection,
}

impl RelationalDB {
    pub fn init(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Creates the tables for the entities when they are missing.
    pub async fn ensure_schema(&self) -> Result<(), DBError> {
        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);
        let mut users_table = schema.create_table_from_entity(Users);
        users_table.if_not_exists();
        let mut messages_table = schema.create_table_from_entity(ContactMessages);
        messages_table.if_not_exists();
        self.connection.execute(backend.build(&users_table)).await?;
        self.connection
            .execute(backend.build(&messages_table))
            .await?;
        Ok(())
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DBError> {
        let email = normalize_email(&new_user.email);
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(DBError::DuplicateEmail);
        }
        let user = users::ActiveModel {
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            email: Set(email),
            birthdate: Set(new_user.birthdate),
            password_hash: Set(new_user.password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.connection)
        .await
        .map_err(user_insert_error)?;
        Ok(user.into())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DBError> {
        let user = Users::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.connection)
            .await?;
        Ok(user.map(|user| user.into()))
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, DBError> {
        let user = Users::find_by_id(id.0).one(&self.connection).await?;
        Ok(user.map(|user| user.into()))
    }

    pub async fn register_message(
        &self,
        user_id: Option<UserId>,
        message: NewContactMessage,
    ) -> Result<ContactMessage, DBError> {
        if let Some(id) = user_id {
            if self.get_user(id).await?.is_none() {
                return Err(DBError::UnknownUser);
            }
        }
        let stored = contact_messages::ActiveModel {
            user_id: Set(user_id.map(|id| id.0)),
            name: Set(message.name),
            email: Set(message.email),
            message: Set(message.message),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.connection)
        .await?;
        Ok(stored.into())
    }

    pub async fn messages_for_user(&self, user_id: UserId) -> Result<Vec<ContactMessage>, DBError> {
        let messages = ContactMessages::find()
            .filter(contact_messages::Column::UserId.eq(user_id.0))
            .order_by_asc(contact_messages::Column::Id)
            .all(&self.connection)
            .await?;
        Ok(messages.into_iter().map(|msg| msg.into()).collect())
    }

    pub async fn all_messages(&self) -> Result<Vec<ContactMessage>, DBError> {
        let messages = ContactMessages::find()
            .order_by_asc(contact_messages::Column::Id)
            .all(&self.connection)
            .await?;
        Ok(messages.into_iter().map(|msg| msg.into()).collect())
    }
}
