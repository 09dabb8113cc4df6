//! Form bodies accepted by the web handlers.

use serde::Deserialize;
use validator::Validate;

use super::validation::{email_rule, full_name_rule, no_control_chars, years_rule};
use crate::profile::NewDoctorDetails;

/// Login form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub password: String,
}

/// Profile edit form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateProfileForm {
    #[validate(custom(function = "full_name_rule"))]
    pub full_name: String,
    #[validate(custom(function = "email_rule"))]
    pub email: String,
}

/// Doctor details form. Lengths are checked by
/// [`NewDoctorDetails::validate`] after conversion.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct DoctorDetailsForm {
    pub specialization: String,
    pub qualification: String,
    #[validate(custom(function = "years_rule"))]
    pub experience_years: String,
    pub hospital: String,
    pub location: String,
    #[validate(custom(function = "no_control_chars"))]
    pub about: String,
}

impl DoctorDetailsForm {
    /// Convert into normalized details. Call after `validate()`; an
    /// unparsable year count becomes `-1` and fails the range check.
    pub fn into_details(self) -> NewDoctorDetails {
        NewDoctorDetails {
            experience_years: self.experience_years.trim().parse().unwrap_or(-1),
            specialization: self.specialization,
            qualification: self.qualification,
            hospital: self.hospital,
            location: self.location,
            about: Some(self.about),
        }
        .normalized()
    }
}

/// `?_method=PUT` on a POST form.
#[derive(Debug, Default, Deserialize)]
pub struct MethodOverride {
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl MethodOverride {
    /// Whether the form asks to be treated as a PUT.
    pub fn is_put(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("put"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details_form(years: &str, about: &str) -> DoctorDetailsForm {
        DoctorDetailsForm {
            specialization: " Cardiology ".to_string(),
            qualification: "MD".to_string(),
            experience_years: years.to_string(),
            hospital: "City Hospital".to_string(),
            location: "Pune".to_string(),
            about: about.to_string(),
        }
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let form = LoginForm {
            username: "alice".to_string(),
            password: String::new(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_details_form_conversion() {
        let form = details_form(" 12", "  ");
        assert!(form.validate().is_ok());

        let details = form.into_details();
        assert_eq!(details.specialization, "Cardiology");
        assert_eq!(details.experience_years, 12);
        assert_eq!(details.about, None);
        assert!(details.validate().is_ok());
    }

    #[test]
    fn test_details_form_bad_years() {
        let form = details_form("a decade", "");
        assert!(form.validate().is_err());
        assert!(form.into_details().validate().is_err());
    }

    #[test]
    fn test_method_override() {
        let put: MethodOverride = parse_override("_method=PUT");
        assert!(put.is_put());
        let none: MethodOverride = parse_override("");
        assert!(!none.is_put());
    }

    fn parse_override(query: &str) -> MethodOverride {
        let uri: axum::http::Uri = format!("/x?{query}").parse().unwrap();
        axum::extract::Query::<MethodOverride>::try_from_uri(&uri)
            .unwrap()
            .0
    }
}
