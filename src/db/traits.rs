use crate::errors::{field_errors, AppErrors};
use validator::Validate;

/// Input that arrives from a browser form and is normalised before it is
/// validated or stored.
pub trait ExternalText {
    fn cleaned(&self) -> Self;

    fn clean(&self, value: &str) -> String {
        value.trim().to_string()
    }
}

/// Request bodies whose fields are reported in the order they are declared.
pub trait DeclaredFields: Validate {
    const FIELDS: &'static [&'static str];

    /// Validates, leading the error summary with the first declared field
    /// that failed.
    fn check(&self) -> Result<(), AppErrors> {
        self.validate()
            .map_err(|errors| AppErrors::invalid(field_errors(&errors), Self::FIELDS))
    }
}
