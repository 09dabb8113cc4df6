//! Uploaded file records.

use sqlx::SqlitePool;

use crate::{CareError, Result};

/// Metadata of a file a user uploaded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UploadedFile {
    /// Unique file ID.
    pub id: i64,
    /// Owning user.
    pub owner_id: i64,
    /// Original filename (display name).
    pub filename: String,
    /// Stored filename (UUID.ext format).
    pub stored_name: String,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// File size in bytes.
    pub size: i64,
    /// Optional description.
    pub description: Option<String>,
    /// When the file was uploaded.
    pub created_at: String,
}

impl UploadedFile {
    /// Whether browsers can show this file inline as an image.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewUploadedFile {
    /// Owning user.
    pub owner_id: i64,
    /// Original filename.
    pub filename: String,
    /// Stored filename.
    pub stored_name: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes.
    pub size: i64,
    /// Optional description.
    pub description: Option<String>,
}

impl NewUploadedFile {
    /// Create a new file record.
    pub fn new(
        owner_id: i64,
        filename: impl Into<String>,
        stored_name: impl Into<String>,
        content_type: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            owner_id,
            filename: filename.into(),
            stored_name: stored_name.into(),
            content_type: content_type.into(),
            size,
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

const FILE_COLUMNS: &str =
    "id, owner_id, filename, stored_name, content_type, size, description, created_at";

/// Repository for uploaded file records.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a file record.
    pub async fn create(&self, file: &NewUploadedFile) -> Result<UploadedFile> {
        let result = sqlx::query(
            "INSERT INTO uploaded_files (owner_id, filename, stored_name, content_type, size, description)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(file.owner_id)
        .bind(&file.filename)
        .bind(&file.stored_name)
        .bind(&file.content_type)
        .bind(file.size)
        .bind(&file.description)
        .execute(self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| CareError::NotFound("file".to_string()))
    }

    /// Get a file record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UploadedFile>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = ?");
        let file = sqlx::query_as::<_, UploadedFile>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(file)
    }

    /// List the files of one owner, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<UploadedFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files WHERE owner_id = ? ORDER BY id DESC"
        );
        let files = sqlx::query_as::<_, UploadedFile>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool)
            .await?;
        Ok(files)
    }

    /// Count the files of one owner.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploaded_files WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    /// Delete a file record. Returns false if it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM uploaded_files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
