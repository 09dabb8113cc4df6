//! Doctor details: the professional data attached to a doctor's profile.

use sqlx::SqlitePool;

use crate::auth::validation::{
    validate_about, validate_detail, validate_experience, ValidationError,
};
use crate::{CareError, Result};

/// Professional details of a doctor. At most one row per user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DoctorDetails {
    /// Row ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Medical specialization.
    pub specialization: String,
    /// Degrees and certifications.
    pub qualification: String,
    /// Years of practice.
    pub experience_years: i64,
    /// Hospital or clinic.
    pub hospital: String,
    /// City or address.
    pub location: String,
    /// Free-text introduction.
    pub about: Option<String>,
    /// Last modification timestamp.
    pub updated_at: String,
}

/// Input for creating or replacing doctor details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoctorDetails {
    /// Medical specialization.
    pub specialization: String,
    /// Degrees and certifications.
    pub qualification: String,
    /// Years of practice.
    pub experience_years: i64,
    /// Hospital or clinic.
    pub hospital: String,
    /// City or address.
    pub location: String,
    /// Free-text introduction.
    pub about: Option<String>,
}

impl NewDoctorDetails {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_detail("specialization", &self.specialization)?;
        validate_detail("qualification", &self.qualification)?;
        validate_experience(self.experience_years)?;
        validate_detail("hospital", &self.hospital)?;
        validate_detail("location", &self.location)?;
        if let Some(ref about) = self.about {
            validate_about(about)?;
        }
        Ok(())
    }

    /// Trim text fields; an empty `about` becomes `None`.
    pub fn normalized(self) -> Self {
        Self {
            specialization: self.specialization.trim().to_string(),
            qualification: self.qualification.trim().to_string(),
            experience_years: self.experience_years,
            hospital: self.hospital.trim().to_string(),
            location: self.location.trim().to_string(),
            about: self
                .about
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        }
    }
}

const DETAILS_COLUMNS: &str = "id, user_id, specialization, qualification, experience_years, \
                               hospital, location, about, updated_at";

/// Repository for doctor details.
pub struct DoctorDetailsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DoctorDetailsRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create or replace the details of a user.
    pub async fn upsert(&self, user_id: i64, details: &NewDoctorDetails) -> Result<DoctorDetails> {
        sqlx::query(
            "INSERT INTO doctor_details
                 (user_id, specialization, qualification, experience_years, hospital, location, about)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 specialization = excluded.specialization,
                 qualification = excluded.qualification,
                 experience_years = excluded.experience_years,
                 hospital = excluded.hospital,
                 location = excluded.location,
                 about = excluded.about,
                 updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(&details.specialization)
        .bind(&details.qualification)
        .bind(details.experience_years)
        .bind(&details.hospital)
        .bind(&details.location)
        .bind(&details.about)
        .execute(self.pool)
        .await?;

        self.get_by_user(user_id)
            .await?
            .ok_or_else(|| CareError::NotFound("doctor details".to_string()))
    }

    /// Get the details of a user.
    pub async fn get_by_user(&self, user_id: i64) -> Result<Option<DoctorDetails>> {
        let sql = format!("SELECT {DETAILS_COLUMNS} FROM doctor_details WHERE user_id = ?");
        let details = sqlx::query_as::<_, DoctorDetails>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(details)
    }

    /// Get the details of several users at once.
    pub async fn list_for_users(&self, user_ids: &[i64]) -> Result<Vec<DoctorDetails>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT {DETAILS_COLUMNS} FROM doctor_details WHERE user_id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in user_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let details = query
            .build_query_as::<DoctorDetails>()
            .fetch_all(self.pool)
            .await?;
        Ok(details)
    }
}
