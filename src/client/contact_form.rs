use crate::client::ContactApi;
use crate::data_models::UserProfile;
use crate::errors::CONTACT_FAILURE_MESSAGE;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const LOGIN_NOTICE: &str = "Please login to send us a message.";
pub const MISSING_FIELDS: &str = "All fields are required";
const SUBMIT_LABEL: &str = "Send Message";
const SENDING_LABEL: &str = "Sending...";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactFields {
    fn any_blank(&self) -> bool {
        [&self.name, &self.email, &self.message]
            .iter()
            .any(|value| value.trim().is_empty())
    }
}

/// Who is logged in, as far as the form cares.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl From<&UserProfile> for Identity {
    fn from(user: &UserProfile) -> Self {
        Self {
            name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Message,
}

/// Everything needed to draw the form.
#[derive(Debug, PartialEq)]
pub struct ContactFormView<'a> {
    pub fields: &'a ContactFields,
    pub fields_disabled: bool,
    pub submit_disabled: bool,
    pub submit_label: &'static str,
    pub notice: Option<&'static str>,
    pub error: Option<&'a str>,
    pub success: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    identity: Option<Identity>,
    fields: ContactFields,
    in_flight: bool,
    error: Option<String>,
    success: Option<String>,
}

impl ContactForm {
    /// A fresh form, pre-filled from the identity when there is one.
    pub fn new(identity: Option<Identity>) -> Self {
        let fields = identity
            .as_ref()
            .map(|identity| ContactFields {
                name: identity.name.clone(),
                email: identity.email.clone(),
                message: String::new(),
            })
            .unwrap_or_default();
        Self {
            identity,
            fields,
            ..Default::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn fields(&self) -> &ContactFields {
        &self.fields
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Applies a keystroke. Disabled fields ignore input.
    pub fn update(&mut self, field: Field, value: impl Into<String>) {
        if !self.is_authenticated() {
            return;
        }
        let value = value.into();
        match field {
            Field::Name => self.fields.name = value,
            Field::Email => self.fields.email = value,
            Field::Message => self.fields.message = value,
        }
    }

    pub fn view(&self) -> ContactFormView<'_> {
        let authenticated = self.is_authenticated();
        ContactFormView {
            fields: &self.fields,
            fields_disabled: !authenticated,
            submit_disabled: !authenticated || self.in_flight,
            submit_label: if self.in_flight {
                SENDING_LABEL
            } else {
                SUBMIT_LABEL
            },
            notice: (!authenticated).then_some(LOGIN_NOTICE),
            error: self.error.as_deref(),
            success: self.success.as_deref(),
        }
    }

    /// Sends the form. Does nothing while the submit control is disabled.
    pub async fn submit<A: ContactApi + ?Sized>(&mut self, api: &A) {
        if self.view().submit_disabled {
            return;
        }
        self.error = None;
        self.success = None;
        if self.fields.any_blank() {
            self.error = Some(MISSING_FIELDS.to_string());
            return;
        }

        self.in_flight = true;
        let outcome = match api.fetch_csrf_cookie().await {
            Ok(()) => api.submit_contact(&self.fields).await,
            Err(err) => Err(err),
        };
        self.in_flight = false;

        match outcome {
            Ok(response) if response.success => {
                self.success = Some(response.message);
                self.fields.message.clear();
            }
            Ok(response) => self.error = Some(response.message),
            Err(err) => {
                warn!(error = %err, "contact submission did not reach the server");
                self.error = Some(CONTACT_FAILURE_MESSAGE.to_string());
            }
        }
    }
}
