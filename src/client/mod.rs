//! Browser-side half of the site: form state and the HTTP client that
//! drives the API.

mod auth_forms;
mod contact_form;
mod http;

pub use auth_forms::{LoginForm, RegisterForm};
pub use contact_form::{ContactFields, ContactForm, ContactFormView, Field, Identity};
pub use http::ApiClient;

use crate::data_models::ContactResponse;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to parse string as url: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("unexpected response with status {0}: {1}")]
    UnexpectedResponse(u16, String),
}

/// What the contact form needs from the server.
#[async_trait]
pub trait ContactApi: Send + Sync {
    async fn fetch_csrf_cookie(&self) -> Result<(), ClientError>;

    async fn submit_contact(&self, fields: &ContactFields) -> Result<ContactResponse, ClientError>;
}
