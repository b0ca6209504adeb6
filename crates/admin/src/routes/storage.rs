//! Media uploads and the media library.
//!
//! ```text
//! POST   /api/storage/upload?kind=media|branding&folder=...   multipart, field "file"
//! GET    /api/storage/files?folder=...
//! DELETE /api/storage/files/{id}
//! POST   /api/storage/bulk-delete   {"ids": [..]} -> {succeeded, failed, errors}
//! ```

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use futures::future::join_all;
use serde::Deserialize;

use pazar_core::MediaFileId;

use crate::db::{MediaRepository, RepositoryError};
use crate::error::{ApiResponse, AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::{BulkDeleteReport, BulkDeleteRequest, MediaFile, MediaQuery, NewMediaFile};
use crate::state::AppState;
use crate::storage::{
    ObjectStore, StorageError, UploadKind, object_key, public_url, sanitize_file_name,
    sanitize_folder,
};

/// Multipart framing on top of the largest allowed file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    let max_body = UploadKind::Media.policy().max_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route(
            "/api/storage/upload",
            post(upload).layer(DefaultBodyLimit::max(max_body)),
        )
        .route("/api/storage/files", get(index))
        .route("/api/storage/files/{id}", delete(destroy))
        .route("/api/storage/bulk-delete", post(bulk_delete))
}

#[derive(Debug, Default, Deserialize)]
struct UploadQuery {
    #[serde(default)]
    kind: UploadKind,
    folder: Option<String>,
}

/// Store one file and record it in the media library.
#[tracing::instrument(skip(state, multipart), fields(kind = ?query.kind))]
async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MediaFile>>)> {
    let mut multipart = multipart?;
    let policy = query.kind.policy();
    let folder = match query.folder.as_deref().map(sanitize_folder) {
        Some(folder) if !folder.is_empty() => folder,
        _ => query.kind.default_folder().to_string(),
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let name = sanitize_file_name(field.file_name().unwrap_or("file"));
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        // Reject the type before reading the body.
        policy.check(&content_type, 1)?;

        let bytes = field.bytes().await?;
        policy.check(&content_type, bytes.len())?;

        let key = object_key(&folder, &name);
        state.store().put(&key, &bytes).await?;

        let record = NewMediaFile {
            name,
            folder: folder.clone(),
            url: public_url(&state.config().media_base_url, &key),
            path: key,
            size_bytes: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
            content_type,
        };

        let file = match MediaRepository::new(state.pool()).create(&record).await {
            Ok(file) => file,
            Err(e) => {
                // Do not leave an unreferenced object behind.
                if let Err(cleanup) = state.store().delete(&record.path).await {
                    tracing::warn!(error = %cleanup, key = %record.path, "Orphaned upload");
                }
                return Err(e.into());
            }
        };

        tracing::info!(media_id = %file.id, key = %file.path, size = file.size_bytes, "File uploaded");
        return Ok((StatusCode::CREATED, ApiResponse::ok(file)));
    }

    Err(AppError::BadRequest("missing multipart field \"file\"".to_string()))
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<ApiResponse<Vec<MediaFile>>>> {
    let folder = query.folder.as_deref().map(sanitize_folder);
    let files = MediaRepository::new(state.pool())
        .list(folder.as_deref())
        .await?;
    Ok(ApiResponse::ok(files))
}

/// Remove the object first, then the record, so a failed delete can be
/// retried from the library.
async fn remove(state: &AppState, id: MediaFileId) -> Result<()> {
    let repo = MediaRepository::new(state.pool());
    let file = repo
        .get(id)
        .await?
        .ok_or(AppError::Database(RepositoryError::NotFound))?;

    state.store().delete(&file.path).await?;
    repo.delete(id).await?;
    tracing::info!(media_id = %id, key = %file.path, "File deleted");
    Ok(())
}

#[tracing::instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<MediaFileId>) -> Result<StatusCode> {
    remove(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete many files concurrently. Each file succeeds or fails on its own.
#[tracing::instrument(skip(state, request), fields(count = request.ids.len()))]
async fn bulk_delete(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<BulkDeleteReport>>> {
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("no file ids given".to_string()));
    }

    let outcomes = join_all(request.ids.iter().map(|&id| {
        let state = state.clone();
        async move { (id, remove(&state, id).await) }
    }))
    .await;

    let mut report = BulkDeleteReport::default();
    for (id, outcome) in outcomes {
        report.record(id, outcome.map_err(|e| client_message(&e)));
    }
    if report.failed > 0 {
        tracing::warn!(failed = report.failed, "Bulk delete partially failed");
    }
    Ok(ApiResponse::ok(report))
}

fn client_message(err: &AppError) -> String {
    match err {
        AppError::Database(RepositoryError::NotFound) => "not found".to_string(),
        AppError::Database(_) | AppError::Storage(StorageError::Io(_)) => {
            tracing::error!(error = %err, "Bulk delete item failed");
            "internal error".to_string()
        }
        other => other.to_string(),
    }
}
