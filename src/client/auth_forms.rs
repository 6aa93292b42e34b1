use crate::data_models::age_on;
use crate::db::rules::DATE_FORMAT;
use crate::db::{Credentials, Registration};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email pattern"));

const MIN_PASSWORD_LEN: usize = 6;

fn looks_like_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Checks the form before anything is sent.
    pub fn validate(&self) -> Result<Credentials, &'static str> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err("Please enter your email address.");
        }
        if !looks_like_email(email) {
            return Err("Please enter a valid email address.");
        }
        if self.password.is_empty() {
            return Err("Please enter your password.");
        }
        Ok(Credentials {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`, as a date input yields it.
    pub birthdate: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Age shown next to the birthdate input. Empty until the date parses,
    /// and for dates after `today`.
    pub fn age(&self, today: NaiveDate) -> Option<u32> {
        let birthdate = NaiveDate::parse_from_str(self.birthdate.trim(), DATE_FORMAT).ok()?;
        (birthdate <= today).then(|| age_on(birthdate, today))
    }

    pub fn validate(&self) -> Result<Registration, &'static str> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.birthdate,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err("All fields are required!");
        }
        if !looks_like_email(self.email.trim()) {
            return Err("Invalid email format!");
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match!");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 6 characters!");
        }
        Ok(Registration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            birthdate: self.birthdate.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            password_confirmation: self.confirm_password.clone(),
        })
    }
}
