//! Form and view-model types for the web layer.

pub mod request;
pub mod response;
pub mod validation;

pub use request::{DoctorDetailsForm, LoginForm, MethodOverride, UpdateProfileForm};
pub use response::{DoctorCardView, DoctorDetailsView, FileView, UserView};
pub use validation::first_error_message;
