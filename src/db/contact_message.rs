use crate::db::relational::entities;
use crate::db::traits::{DeclaredFields, ExternalText};
use crate::db::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored contact message. Never changed after it is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactMessage {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<entities::contact_messages::Model> for ContactMessage {
    fn from(model: entities::contact_messages::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id.map(UserId),
            name: model.name,
            email: model.email,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

/// The body of a contact submission. Missing fields deserialize as empty
/// strings so they are reported by validation rather than by the decoder.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct NewContactMessage {
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::required"), length(max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(
        custom(function = "crate::db::rules::required"),
        email,
        length(max = 255)
    )]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::required"))]
    pub message: String,
}

impl DeclaredFields for NewContactMessage {
    const FIELDS: &'static [&'static str] = &["name", "email", "message"];
}

impl ExternalText for NewContactMessage {
    fn cleaned(&self) -> Self {
        Self {
            name: self.clean(&self.name),
            email: self.clean(&self.email),
            message: self.clean(&self.message),
        }
    }
}
