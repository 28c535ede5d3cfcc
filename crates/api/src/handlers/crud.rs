//! Generic handlers for the admin collections.
//!
//! Each handler is instantiated per entity type (`crud::list::<Workshop>`).
//! Lists are fetched in full, newest first, and narrowed in memory by the
//! `search` term and the schema's dropdown filters; stats and exports see
//! exactly the rows the list shows.

use std::collections::HashMap;

use atelier_core::document::{is_meta_field, Document, Fields};
use atelier_core::error::CoreError;
use atelier_core::export::{self, ExportFormat};
use atelier_core::{filter, stats};
use atelier_db::models::{parse_entity, validate_entity, Entity, Record};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_super_admin, RequireAdmin};
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Collections flagged super-admin-only reject plain admins.
pub(crate) fn authorize<E: Entity>(user: &AuthUser) -> AppResult<()> {
    if E::SUPER_ADMIN_ONLY {
        require_super_admin(user)?;
    }
    Ok(())
}

pub(crate) fn not_found<E: Entity>(id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: E::SCHEMA.label,
        id: id.to_string(),
    })
}

/// Decode documents, skipping (and logging) any that no longer fit the model.
/// Each record keeps the raw document it came from.
fn decode_all<E: Entity>(docs: Vec<Document>) -> Vec<(Document, Record<E>)> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match Record::from_document(E::SCHEMA.collection, doc.clone()) {
                Ok(record) => Some((doc, record)),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Skipping malformed document");
                    None
                }
            }
        })
        .collect()
}

/// The decodable documents of the collection, narrowed by the request's
/// search and filters. List, stats and export all read this one view.
async fn filtered<E: Entity>(
    state: &AppState,
    params: &ListParams,
) -> AppResult<Vec<(Document, Record<E>)>> {
    let docs = state.facade.list_documents::<E>().await?;
    let list_filter = params.to_filter(&E::SCHEMA);
    Ok(decode_all::<E>(filter::apply(&docs, &E::SCHEMA, &list_filter)))
}

fn documents<E>(rows: Vec<(Document, Record<E>)>) -> Vec<Document> {
    rows.into_iter().map(|(doc, _)| doc).collect()
}

/// Parse and validate a submitted body. Nothing is written on failure.
pub(crate) fn parse_valid<E: Entity>(fields: Fields) -> AppResult<E> {
    let entity = parse_entity::<E>(fields)?;
    validate_entity(&entity)?;
    Ok(entity)
}

/// Remove the objects a deleted record owned. Failures only warn.
pub(crate) async fn delete_owned_objects<E: Entity>(state: &AppState, doc: Document) {
    let id = doc.id.clone();
    let record = match Record::<E>::from_document(E::SCHEMA.collection, doc) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "Cannot resolve objects of deleted record");
            return;
        }
    };
    for path in record.data.object_paths() {
        match state.objects.delete(&path).await {
            Ok(true) => tracing::info!(path = %path, "Owned object deleted"),
            Ok(false) => tracing::debug!(path = %path, "Owned object already gone"),
            Err(e) => {
                tracing::warn!(path = %path, id = %id, error = %e, "Failed to delete owned object");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/{resource}?search=&{filter}=
pub async fn list<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<impl IntoResponse> {
    authorize::<E>(&user)?;
    let params = ListParams::from(params);
    let rows = filtered::<E>(&state, &params).await?;
    let records: Vec<Record<E>> = rows.into_iter().map(|(_, record)| record).collect();
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/admin/{resource}/{id}
pub async fn get<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    authorize::<E>(&user)?;
    let record = state
        .facade
        .get::<E>(&id)
        .await?
        .ok_or_else(|| not_found::<E>(&id))?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/admin/{resource}
///
/// Only the fields the entity models are stored.
pub async fn create<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<Fields>,
) -> AppResult<impl IntoResponse> {
    authorize::<E>(&user)?;
    let entity = parse_valid::<E>(body)?;
    let record = state.facade.create(&entity).await?;

    tracing::info!(
        collection = E::SCHEMA.collection,
        id = %record.id,
        uid = %user.uid,
        "Record created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// PUT /api/v1/admin/{resource}/{id}
///
/// The body is merged over the stored fields and the result validated as a
/// whole, so partial bodies are accepted. Fields the entity does not model
/// are left as they are.
pub async fn update<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Fields>,
) -> AppResult<impl IntoResponse> {
    authorize::<E>(&user)?;
    let existing = state
        .facade
        .get_document::<E>(&id)
        .await?
        .ok_or_else(|| not_found::<E>(&id))?;

    let mut merged = existing.fields;
    merged.extend(body.into_iter().filter(|(key, _)| !is_meta_field(key)));
    let entity = parse_valid::<E>(merged)?;

    let record = state
        .facade
        .update(&id, &entity)
        .await?
        .ok_or_else(|| not_found::<E>(&id))?;

    tracing::info!(
        collection = E::SCHEMA.collection,
        id = %id,
        uid = %user.uid,
        "Record updated"
    );
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/admin/{resource}/{id}
///
/// Other records referencing this one are left untouched.
pub async fn delete<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    authorize::<E>(&user)?;
    let removed = state
        .facade
        .delete::<E>(&id)
        .await?
        .ok_or_else(|| not_found::<E>(&id))?;

    tracing::info!(
        collection = E::SCHEMA.collection,
        id = %id,
        uid = %user.uid,
        "Record deleted"
    );
    delete_owned_objects::<E>(&state, removed).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/{resource}/stats?search=&{filter}=
pub async fn stats<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<impl IntoResponse> {
    authorize::<E>(&user)?;
    let params = ListParams::from(params);
    let docs = documents(filtered::<E>(&state, &params).await?);
    Ok(Json(DataResponse {
        data: stats::compute(&docs, &E::SCHEMA),
    }))
}

/// GET /api/v1/admin/{resource}/export?format=csv|json&search=&{filter}=
///
/// Served as an attachment named `<collection>-<YYYY-MM-DD>.<ext>`.
pub async fn export<E: Entity>(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<impl IntoResponse> {
    authorize::<E>(&user)?;
    let params = ListParams::from(params);
    let format = ExportFormat::parse(params.format.as_deref())?;
    let docs = documents(filtered::<E>(&state, &params).await?);

    let body = match format {
        ExportFormat::Csv => export::to_csv(&docs, E::SCHEMA.export_columns),
        ExportFormat::Json => serde_json::to_string_pretty(&export::to_json(&docs))
            .map_err(|e| AppError::InternalError(format!("Export serialization failed: {e}")))?,
    };
    let filename = export::export_filename(
        E::SCHEMA.collection,
        format,
        chrono::Utc::now().date_naive(),
    );

    tracing::info!(
        collection = E::SCHEMA.collection,
        rows = docs.len(),
        format = format.extension(),
        "Export generated"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}
