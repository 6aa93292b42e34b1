use crate::db::relational::entities;
use crate::db::rules::DATE_FORMAT;
use crate::db::traits::{DeclaredFields, ExternalText};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use validator::Validate;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthdate: NaiveDate,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<entities::users::Model> for User {
    fn from(model: entities::users::Model) -> Self {
        Self {
            id: UserId(model.id),
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            birthdate: model.birthdate,
            password_hash: model.password_hash,
            created_at: model.created_at,
        }
    }
}

/// Emails identify accounts case-insensitively; both stores keep them
/// lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A user ready to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthdate: NaiveDate,
    pub password_hash: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct Registration {
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::required"), length(max = 255))]
    pub first_name: String,
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::required"), length(max = 255))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::birthdate"))]
    pub birthdate: String,
    #[serde(default)]
    #[validate(
        custom(function = "crate::db::rules::required"),
        email,
        length(max = 255)
    )]
    pub email: String,
    #[serde(default)]
    #[validate(
        custom(function = "crate::db::rules::required"),
        length(min = 6),
        must_match(other = "password_confirmation")
    )]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

impl Registration {
    /// The birthdate as a date; `None` until the registration validated.
    pub fn birthdate(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.birthdate, DATE_FORMAT).ok()
    }
}

impl DeclaredFields for Registration {
    const FIELDS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "birthdate",
        "email",
        "password",
        "password_confirmation",
    ];
}

impl ExternalText for Registration {
    fn cleaned(&self) -> Self {
        Self {
            first_name: self.clean(&self.first_name),
            last_name: self.clean(&self.last_name),
            birthdate: self.clean(&self.birthdate),
            email: normalize_email(&self.email),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct Credentials {
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::required"), email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "crate::db::rules::required"))]
    pub password: String,
}

impl DeclaredFields for Credentials {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

impl ExternalText for Credentials {
    fn cleaned(&self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password.clone(),
        }
    }
}
