//! User repository for CareData.
//!
//! This module provides CRUD operations for users in the database.

use sqlx::{QueryBuilder, SqlitePool};

use super::user::{NewUser, Role, User, UserUpdate};
use crate::{CareError, Result};

const USER_COLUMNS: &str = "id, username, email, full_name, role, password, \
                            image_filename, image_stored_name, created_at";

/// Map a unique-constraint violation to `CareError::Conflict`.
fn map_unique(e: sqlx::Error, what: &str) -> CareError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CareError::Conflict(what.to_string())
        }
        _ => CareError::Database(e.to_string()),
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID. A taken username or
    /// email yields `CareError::Conflict`.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, full_name, role, password, image_filename, image_stored_name)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(new_user.role.as_str())
        .bind(&new_user.password)
        .bind(&new_user.image_filename)
        .bind(&new_user.image_stored_name)
        .execute(self.pool)
        .await
        .map_err(|e| map_unique(e, "username or email"))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CareError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref full_name) = update.full_name {
            separated.push("full_name = ");
            separated.push_bind_unseparated(full_name.clone());
        }
        if let Some(ref email) = update.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email.clone());
        }
        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password.clone());
        }
        if let Some((ref filename, ref stored_name)) = update.image {
            separated.push("image_filename = ");
            separated.push_bind_unseparated(filename.clone());
            separated.push("image_stored_name = ");
            separated.push_bind_unseparated(stored_name.clone());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| map_unique(e, "email"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Replace the profile image of a user.
    ///
    /// Returns the previous stored name, if any, so the caller can remove
    /// the old file.
    pub async fn set_image(
        &self,
        id: i64,
        filename: &str,
        stored_name: &str,
    ) -> Result<Option<String>> {
        let previous = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CareError::NotFound("user".to_string()))?
            .image_stored_name;

        sqlx::query("UPDATE users SET image_filename = ?, image_stored_name = ? WHERE id = ?")
            .bind(filename)
            .bind(stored_name)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(previous)
    }

    /// Delete a user by ID.
    ///
    /// Returns true if a user was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all users.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(users)
    }

    /// List users by role.
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY full_name, id");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role.as_str())
            .fetch_all(self.pool)
            .await?;
        Ok(users)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    /// Check if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    /// Check if an email is already registered (case-insensitive).
    ///
    /// `except_id` excludes one user, so a profile update may keep its own email.
    pub async fn email_exists(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE AND id != ?)",
        )
        .bind(email)
        .bind(except_id.unwrap_or(-1))
        .fetch_one(self.pool)
        .await?;
        Ok(exists.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn patient(username: &str) -> NewUser {
        NewUser::new(
            username,
            format!("{username}@example.com"),
            "Test User",
            "hashedpw",
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&patient("testuser")).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "testuser@example.com");
        assert_eq!(user.full_name, "Test User");
        assert_eq!(user.role, Role::Patient);
        assert!(!user.has_image());
    }

    #[tokio::test]
    async fn test_create_doctor_with_image() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let new_user = patient("drhouse")
            .with_role(Role::Doctor)
            .with_image("me.jpg", "ab12.jpg");
        let user = repo.create(&new_user).await.unwrap();

        assert!(user.is_doctor());
        assert_eq!(user.image_filename.as_deref(), Some("me.jpg"));
        assert_eq!(user.image_stored_name.as_deref(), Some("ab12.jpg"));
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&patient("testuser")).await.unwrap();

        let duplicate = NewUser::new("TestUser", "other@example.com", "Other", "pw");
        let result = repo.create(&duplicate).await;

        assert!(matches!(result, Err(CareError::Conflict(_))));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&patient("first")).await.unwrap();

        let duplicate = NewUser::new("second", "FIRST@example.com", "Other", "pw");
        let result = repo.create(&duplicate).await;

        assert!(matches!(result, Err(CareError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let created = repo.create(&patient("testuser")).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(found.unwrap().username, "testuser");

        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_username_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&patient("TestUser")).await.unwrap();

        let found = repo.get_by_username("testuser").await.unwrap();
        assert_eq!(found.unwrap().username, "TestUser");

        assert!(repo.get_by_username("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&patient("testuser")).await.unwrap();

        let found = repo.get_by_email("TESTUSER@example.com").await.unwrap();
        assert_eq!(found.unwrap().username, "testuser");
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&patient("testuser")).await.unwrap();

        let update = UserUpdate::new()
            .full_name("Updated Name")
            .email("new@example.com")
            .image("face.png", "cd34.png");

        let updated = repo.update(user.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.full_name, "Updated Name");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.image_stored_name.as_deref(), Some("cd34.png"));
        // Unchanged fields
        assert_eq!(updated.username, "testuser");
        assert_eq!(updated.password, "hashedpw");
    }

    #[tokio::test]
    async fn test_update_nonexistent_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let update = UserUpdate::new().full_name("New Name");
        assert!(repo.update(999, &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_empty() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&patient("testuser")).await.unwrap();

        let result = repo.update(user.id, &UserUpdate::new()).await.unwrap();
        assert_eq!(result.unwrap().full_name, "Test User");
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&patient("alice")).await.unwrap();
        let bob = repo.create(&patient("bobby")).await.unwrap();

        let update = UserUpdate::new().email("alice@example.com");
        let result = repo.update(bob.id, &update).await;
        assert!(matches!(result, Err(CareError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_set_image_returns_previous() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&patient("testuser")).await.unwrap();

        let previous = repo.set_image(user.id, "a.png", "aa11.png").await.unwrap();
        assert!(previous.is_none());

        let previous = repo.set_image(user.id, "b.png", "bb22.png").await.unwrap();
        assert_eq!(previous.as_deref(), Some("aa11.png"));

        let user = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.image_filename.as_deref(), Some("b.png"));

        let missing = repo.set_image(999, "c.png", "cc33.png").await;
        assert!(matches!(missing, Err(CareError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&patient("testuser")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&patient("patient1")).await.unwrap();
        repo.create(&patient("doctor1").with_role(Role::Doctor))
            .await
            .unwrap();
        repo.create(&patient("doctor2").with_role(Role::Doctor))
            .await
            .unwrap();

        let doctors = repo.list_by_role(Role::Doctor).await.unwrap();
        assert_eq!(doctors.len(), 2);
        assert!(doctors.iter().all(|u| u.is_doctor()));

        assert_eq!(repo.list_by_role(Role::Patient).await.unwrap().len(), 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_username_and_email_exists() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&patient("testuser")).await.unwrap();

        assert!(repo.username_exists("TESTUSER").await.unwrap());
        assert!(!repo.username_exists("other").await.unwrap());

        assert!(repo
            .email_exists("testuser@example.com", None)
            .await
            .unwrap());
        assert!(!repo
            .email_exists("testuser@example.com", Some(user.id))
            .await
            .unwrap());
    }
}
