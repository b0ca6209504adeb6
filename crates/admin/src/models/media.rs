//! Media library entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pazar_core::MediaFileId;

#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub id: MediaFileId,
    pub name: String,
    pub folder: String,
    /// Object store key.
    pub path: String,
    pub url: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a file that was just written to the object store.
#[derive(Debug, Clone)]
pub struct NewMediaFile {
    pub name: String,
    pub folder: String,
    pub path: String,
    pub url: String,
    pub size_bytes: i64,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaQuery {
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<MediaFileId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteError {
    pub id: MediaFileId,
    pub error: String,
}

/// Per-item outcome of a bulk delete. Nothing is rolled back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkDeleteReport {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BulkDeleteError>,
}

impl BulkDeleteReport {
    pub fn record(&mut self, id: MediaFileId, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => self.succeeded += 1,
            Err(error) => {
                self.failed += 1;
                self.errors.push(BulkDeleteError { id, error });
            }
        }
    }
}
