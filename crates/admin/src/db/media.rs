//! Media library metadata. File bytes live in the object store.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pazar_core::MediaFileId;

use super::RepositoryError;
use crate::models::{MediaFile, NewMediaFile};

#[derive(Debug, sqlx::FromRow)]
struct MediaFileRow {
    id: i32,
    name: String,
    folder: String,
    path: String,
    url: String,
    size_bytes: i64,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl From<MediaFileRow> for MediaFile {
    fn from(row: MediaFileRow) -> Self {
        Self {
            id: MediaFileId::new(row.id),
            name: row.name,
            folder: row.folder,
            path: row.path,
            url: row.url,
            size_bytes: row.size_bytes,
            content_type: row.content_type,
            created_at: row.created_at,
        }
    }
}

const SELECT_MEDIA: &str = r"
    SELECT id, name, folder, path, url, size_bytes, content_type, created_at
    FROM media_files
";

/// Repository for media file records.
pub struct MediaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MediaRepository<'a> {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Files in `folder` (all folders when `None`), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, folder: Option<&str>) -> Result<Vec<MediaFile>, RepositoryError> {
        let sql = format!(
            "{SELECT_MEDIA} WHERE ($1::TEXT IS NULL OR folder = $1) ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, MediaFileRow>(&sql)
            .bind(folder)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(MediaFile::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: MediaFileId) -> Result<Option<MediaFile>, RepositoryError> {
        let sql = format!("{SELECT_MEDIA} WHERE id = $1");
        let row = sqlx::query_as::<_, MediaFileRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(MediaFile::from))
    }

    /// Record a file already written to the object store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the path is already recorded.
    pub async fn create(&self, file: &NewMediaFile) -> Result<MediaFile, RepositoryError> {
        let row = sqlx::query_as::<_, MediaFileRow>(
            r"
            INSERT INTO media_files (name, folder, path, url, size_bytes, content_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, folder, path, url, size_bytes, content_type, created_at
            ",
        )
        .bind(&file.name)
        .bind(&file.folder)
        .bind(&file.path)
        .bind(&file.url)
        .bind(file.size_bytes)
        .bind(&file.content_type)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "file path already recorded"))?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn delete(&self, id: MediaFileId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM media_files WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
