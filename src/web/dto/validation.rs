//! Validation helpers for web forms.
//!
//! Forms derive [`validator::Validate`]; the rules below adapt the domain
//! checks in [`crate::auth::validation`] to the `validator` signature.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

use crate::auth::validation::{validate_email, validate_full_name};

/// Pick one message to show the user, preferring fields in name order.
pub fn first_error_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"))
            })
        })
        .unwrap_or_else(|| "Invalid form data".to_string())
}

fn rule_error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

/// Full name rule.
pub fn full_name_rule(value: &str) -> Result<(), ValidationError> {
    validate_full_name(value.trim()).map_err(|e| rule_error("full_name", e.to_string()))
}

/// Email rule.
pub fn email_rule(value: &str) -> Result<(), ValidationError> {
    validate_email(value.trim()).map_err(|e| rule_error("email", e.to_string()))
}

/// Whole number of years.
pub fn years_rule(value: &str) -> Result<(), ValidationError> {
    value
        .trim()
        .parse::<i64>()
        .map(|_| ())
        .map_err(|_| rule_error("years", "experience must be a whole number of years".into()))
}

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(rule_error(
            "no_control_chars",
            "must not contain control characters".into(),
        ));
    }
    Ok(())
}
