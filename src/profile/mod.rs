//! Profile store for CareData.
//!
//! Joins a user with their doctor details and uploaded files into a single
//! [`Profile`] value.

mod details;

pub use details::{DoctorDetails, DoctorDetailsRepository, NewDoctorDetails};

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::db::{Role, User, UserRepository};
use crate::file::{FileRepository, UploadedFile};
use crate::Result;

/// A user together with everything attached to their profile.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The account itself.
    pub user: User,
    /// Doctor details, if the user is a doctor and filled them in.
    pub doctor_details: Option<DoctorDetails>,
    /// Uploaded files, newest first.
    pub files: Vec<UploadedFile>,
}

/// Read-side view over users, doctor details and files.
#[derive(Clone)]
pub struct ProfileStore {
    pool: SqlitePool,
}

impl ProfileStore {
    /// Create a profile store over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the full profile of a user.
    pub async fn profile(&self, user_id: i64) -> Result<Option<Profile>> {
        let Some(user) = UserRepository::new(&self.pool).get_by_id(user_id).await? else {
            return Ok(None);
        };

        let doctor_details = DoctorDetailsRepository::new(&self.pool)
            .get_by_user(user_id)
            .await?;
        let files = FileRepository::new(&self.pool).list_by_owner(user_id).await?;

        Ok(Some(Profile {
            user,
            doctor_details,
            files,
        }))
    }

    /// List all doctors with their details. Files are not loaded.
    pub async fn doctors(&self) -> Result<Vec<Profile>> {
        let users = UserRepository::new(&self.pool)
            .list_by_role(Role::Doctor)
            .await?;
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();

        let mut details: HashMap<i64, DoctorDetails> = DoctorDetailsRepository::new(&self.pool)
            .list_for_users(&ids)
            .await?
            .into_iter()
            .map(|d| (d.user_id, d))
            .collect();

        Ok(users
            .into_iter()
            .map(|user| Profile {
                doctor_details: details.remove(&user.id),
                user,
                files: Vec::new(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;
    use crate::file::NewUploadedFile;
    use crate::Database;

    async fn create_user(db: &Database, username: &str, role: Role) -> User {
        UserRepository::new(db.pool())
            .create(
                &NewUser::new(username, format!("{username}@example.com"), username, "hash")
                    .with_role(role),
            )
            .await
            .unwrap()
    }

    fn details(specialization: &str) -> NewDoctorDetails {
        NewDoctorDetails {
            specialization: specialization.to_string(),
            qualification: "MBBS".to_string(),
            experience_years: 5,
            hospital: "Clinic".to_string(),
            location: "Town".to_string(),
            about: None,
        }
    }

    #[tokio::test]
    async fn test_profile_joins_details_and_files() {
        let db = Database::open_in_memory().await.unwrap();
        let store = ProfileStore::new(db.pool().clone());
        let doctor = create_user(&db, "drwho", Role::Doctor).await;

        DoctorDetailsRepository::new(db.pool())
            .upsert(doctor.id, &details("Neurology"))
            .await
            .unwrap();
        FileRepository::new(db.pool())
            .create(&NewUploadedFile::new(
                doctor.id,
                "cv.pdf",
                format!("{}.pdf", uuid::Uuid::new_v4()),
                "application/pdf",
                10,
            ))
            .await
            .unwrap();

        let profile = store.profile(doctor.id).await.unwrap().unwrap();
        assert_eq!(profile.user.id, doctor.id);
        assert_eq!(
            profile.doctor_details.unwrap().specialization,
            "Neurology"
        );
        assert_eq!(profile.files.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_missing_user() {
        let db = Database::open_in_memory().await.unwrap();
        let store = ProfileStore::new(db.pool().clone());
        assert!(store.profile(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_doctors_only_lists_doctors() {
        let db = Database::open_in_memory().await.unwrap();
        let store = ProfileStore::new(db.pool().clone());

        create_user(&db, "patient1", Role::Patient).await;
        let with = create_user(&db, "doctor1", Role::Doctor).await;
        create_user(&db, "doctor2", Role::Doctor).await;

        DoctorDetailsRepository::new(db.pool())
            .upsert(with.id, &details("Pediatrics"))
            .await
            .unwrap();

        let doctors = store.doctors().await.unwrap();
        assert_eq!(doctors.len(), 2);
        assert!(doctors.iter().all(|p| p.user.is_doctor()));

        let filled: Vec<_> = doctors
            .iter()
            .filter_map(|p| p.doctor_details.as_ref())
            .collect();
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].user_id, with.id);
    }
}
