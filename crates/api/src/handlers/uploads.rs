//! Object uploads for photos, logos and course videos.

use atelier_core::error::CoreError;
use atelier_core::storage::{allowed_content_types, object_path, validate_object_path, validate_upload};
use atelier_db::UploadProgress;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::ObjectPathParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A stored object.
#[derive(Debug, Serialize)]
pub struct UploadedObject {
    /// Storage path; keep it on the record to delete the object later.
    pub path: String,
    pub url: String,
    pub size: u64,
}

/// POST /api/v1/admin/uploads/{folder}
///
/// Multipart form with a required `file` field. The folder decides which
/// content types are accepted; the size limit is `MAX_UPLOAD_BYTES`.
pub async fn upload(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(folder): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    allowed_content_types(&folder)?;
    let max_bytes = state.config.max_upload_bytes;

    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            if (data.len() + chunk.len()) as u64 > max_bytes {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Uploaded file exceeds the limit of {max_bytes} bytes"
                ))));
            }
            data.extend_from_slice(&chunk);
        }
        file = Some((filename, content_type, data));
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let size = data.len() as u64;
    validate_upload(&folder, &content_type, size, max_bytes)?;

    let unique = uuid::Uuid::now_v7().to_string();
    let path = object_path(&folder, &unique, &filename);
    let report = |p: UploadProgress| {
        tracing::debug!(
            path = %path,
            bytes_written = p.bytes_written,
            total_bytes = p.total_bytes,
            percent = p.percent(),
            "Upload progress"
        );
    };
    let url = state.objects.upload(&path, &data, &report).await?;

    tracing::info!(
        path = %path,
        size,
        content_type = %content_type,
        uid = %admin.uid,
        "Object uploaded"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadedObject { path, url, size },
        }),
    ))
}

/// DELETE /api/v1/admin/uploads?path=
pub async fn delete_object(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ObjectPathParams>,
) -> AppResult<StatusCode> {
    validate_object_path(&params.path)?;
    if !state.objects.delete(&params.path).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Object",
            id: params.path,
        }));
    }
    tracing::info!(path = %params.path, uid = %admin.uid, "Object deleted");
    Ok(StatusCode::NO_CONTENT)
}
