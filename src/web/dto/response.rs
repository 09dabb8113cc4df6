//! View models handed to the templates.

use serde::Serialize;

use crate::db::User;
use crate::file::UploadedFile;
use crate::profile::{DoctorDetails, Profile};

/// A user as shown on profile pages.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub role_label: String,
    pub is_doctor: bool,
    pub has_image: bool,
    pub created_at: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str().to_string(),
            role_label: user.role.display_name().to_string(),
            is_doctor: user.is_doctor(),
            has_image: user.has_image(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Doctor details as shown on profiles and the directory.
#[derive(Debug, Serialize)]
pub struct DoctorDetailsView {
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i64,
    pub hospital: String,
    pub location: String,
    pub about: Option<String>,
    pub updated_at: String,
}

impl From<&DoctorDetails> for DoctorDetailsView {
    fn from(details: &DoctorDetails) -> Self {
        Self {
            specialization: details.specialization.clone(),
            qualification: details.qualification.clone(),
            experience_years: details.experience_years,
            hospital: details.hospital.clone(),
            location: details.location.clone(),
            about: details.about.clone(),
            updated_at: details.updated_at.clone(),
        }
    }
}

/// One entry of the doctor directory.
#[derive(Debug, Serialize)]
pub struct DoctorCardView {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub has_image: bool,
    pub details: Option<DoctorDetailsView>,
}

impl From<&Profile> for DoctorCardView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username.clone(),
            full_name: profile.user.full_name.clone(),
            has_image: profile.user.has_image(),
            details: profile.doctor_details.as_ref().map(DoctorDetailsView::from),
        }
    }
}

/// Uploaded file metadata.
#[derive(Debug, Serialize)]
pub struct FileView {
    pub id: i64,
    pub owner_id: i64,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub description: Option<String>,
    pub created_at: String,
    pub is_image: bool,
    pub raw_url: String,
}

impl From<&UploadedFile> for FileView {
    fn from(file: &UploadedFile) -> Self {
        Self {
            id: file.id,
            owner_id: file.owner_id,
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
            description: file.description.clone(),
            created_at: file.created_at.clone(),
            is_image: file.is_image(),
            raw_url: format!("/caredata/users/{}/files/{}/raw", file.owner_id, file.id),
        }
    }
}
