use crate::data_models::{ApiResponse, FieldErrors};
use crate::db::DatabaseError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::{error, warn};
use validator::{ValidationErrors, ValidationErrorsKind};

pub const CONTACT_FAILURE_MESSAGE: &str = "Failed to send message. Please try again.";
const SERVER_ERROR_MESSAGE: &str = "Server error.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read with serde: {0}")]
    SerdeError(#[from] serde_json::error::Error),
    #[error("socket address parsing error: {0}")]
    SocketAddressParsingError(#[from] std::net::AddrParseError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error(transparent)]
    AppErrors(#[from] AppErrors),
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("unknown database type")]
    UnknownDatabaseType,
    #[error("data file not found")]
    DataFileNotFound,
    #[error("missing database settings")]
    MissingDatabaseSettings,
    #[error("{0}")]
    UnknownEnvironment(String),
    #[error("failed to read configuration: {0}")]
    ConfigError(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum AppErrors {
    #[error("invalid configuration: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error("database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("validation failed: {message}")]
    ValidationError { message: String, errors: FieldErrors },
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("csrf token mismatch")]
    CsrfTokenMismatch,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("failed to store contact message: {0}")]
    SubmissionFailed(DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHashError(String),
    #[error("session store is unavailable")]
    SessionUnavailable,
}

impl AppErrors {
    /// A validation failure; `order` decides which field leads the summary.
    pub fn invalid(errors: FieldErrors, order: &[&str]) -> Self {
        AppErrors::ValidationError {
            message: summary(&errors, order),
            errors,
        }
    }
}

impl From<JsonRejection> for AppErrors {
    fn from(rejection: JsonRejection) -> Self {
        AppErrors::MalformedPayload(rejection.body_text())
    }
}

/// Flattens validator output into `field -> messages`. A failed `required`
/// rule hides every other message for that field.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, kind) in errors.errors() {
        let ValidationErrorsKind::Field(errs) = kind else {
            continue;
        };
        let required = errs.iter().find(|e| e.code == "required");
        let messages = match required {
            Some(err) => vec![message_for(field, err)],
            None => errs.iter().map(|err| message_for(field, err)).collect(),
        };
        fields.insert(field.to_string(), messages);
    }
    fields
}

fn message_for(field: &str, err: &validator::ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    let field = field.replace('_', " ");
    let param = |name: &str| {
        err.params
            .get(name)
            .map(|value| value.to_string())
            .unwrap_or_default()
    };
    match err.code.as_ref() {
        "required" => format!("The {field} field is required."),
        "email" => format!("The {field} field must be a valid email address."),
        "must_match" => format!("The {field} field confirmation does not match."),
        "length" if err.params.contains_key("max") => format!(
            "The {field} field must not be greater than {} characters.",
            param("max")
        ),
        "length" => format!(
            "The {field} field must be at least {} characters.",
            param("min")
        ),
        _ => format!("The {field} field is invalid."),
    }
}

/// The headline message of a failed validation: the first error, plus a
/// count of the remaining ones. Fields named in `order` come first, in that
/// order; any others follow alphabetically.
pub fn summary(errors: &FieldErrors, order: &[&str]) -> String {
    let declared = order.iter().filter_map(|field| errors.get(*field));
    let others = errors
        .iter()
        .filter(|(field, _)| !order.contains(&field.as_str()))
        .map(|(_, messages)| messages);
    let mut all = declared.chain(others).flatten();
    let Some(first) = all.next() else {
        return "The given data was invalid.".to_string();
    };
    match all.count() {
        0 => first.to_string(),
        1 => format!("{first} (and 1 more error)"),
        n => format!("{first} (and {n} more errors)"),
    }
}

impl IntoResponse for AppErrors {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppErrors::ValidationError { message, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiResponse::invalid(message, errors),
            ),
            AppErrors::MalformedPayload(detail) => {
                warn!(%detail, "rejected malformed payload");
                (
                    StatusCode::BAD_REQUEST,
                    ApiResponse::failure("Malformed payload."),
                )
            }
            AppErrors::CsrfTokenMismatch => (
                StatusCode::FORBIDDEN,
                ApiResponse::failure("CSRF token mismatch."),
            ),
            AppErrors::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::failure("Unauthenticated."),
            ),
            AppErrors::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::failure("The provided credentials are incorrect."),
            ),
            AppErrors::SubmissionFailed(err) => {
                error!(error = %err, "contact message was not stored");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure(CONTACT_FAILURE_MESSAGE),
                )
            }
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure(SERVER_ERROR_MESSAGE),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
