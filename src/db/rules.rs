use chrono::{NaiveDate, Utc};
use std::borrow::Cow;
use validator::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// A `YYYY-MM-DD` date strictly before today.
pub fn birthdate(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| with_message("date", "The birthdate field must be a valid date."))?;
    if date >= Utc::now().date_naive() {
        return Err(with_message(
            "before",
            "The birthdate field must be a date before today.",
        ));
    }
    Ok(())
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}
