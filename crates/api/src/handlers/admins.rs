//! Handlers for the `admins` collection that go beyond generic CRUD.
//!
//! Listing, reading, stats and export use [`crud`](super::crud). Creation
//! and updates keep emails lower-cased and unique; deletion and email
//! changes end the admin's sessions.

use atelier_core::document::{is_meta_field, Fields};
use atelier_core::error::CoreError;
use atelier_db::models::admin::Admin;
use atelier_db::models::{to_fields, Record};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::crud::{not_found, parse_valid};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireSuperAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/admins
///
/// Grants console access to an email. Returns 409 if an admin already
/// carries it.
pub async fn create_admin(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<Fields>,
) -> AppResult<impl IntoResponse> {
    let mut admin = parse_valid::<Admin>(body)?;
    admin.email = admin.email.trim().to_lowercase();

    ensure_email_free(&state, &admin.email, None).await?;

    let record = state.facade.create(&admin).await?;
    tracing::info!(
        admin_id = %record.id,
        role = %record.data.role,
        granted_by = %user.uid,
        "Admin created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// 409 unless `email` is free or already belongs to the admin `own_id`.
async fn ensure_email_free(state: &AppState, email: &str, own_id: Option<&str>) -> AppResult<()> {
    let holder: Option<Record<Admin>> = state.facade.find_by::<Admin>("email", email).await?;
    match holder {
        Some(other) if Some(other.id.as_str()) != own_id => Err(AppError::Core(
            CoreError::Conflict(format!("An admin with email {email} already exists")),
        )),
        _ => Ok(()),
    }
}

/// PUT /api/v1/admin/admins/{id}
///
/// Merges the body over the stored record. The email is lower-cased and
/// must stay unique. `uid` is not writable here: it is linked on sign-in.
/// Changing the email unlinks the identity and revokes its sessions, so the
/// admin signs in again under the new address. Role changes apply to open
/// sessions on their next request.
pub async fn update_admin(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Fields>,
) -> AppResult<impl IntoResponse> {
    let existing = state
        .facade
        .get::<Admin>(&id)
        .await?
        .ok_or_else(|| not_found::<Admin>(&id))?;

    let mut merged = to_fields(&existing.data)?;
    merged.extend(
        body.into_iter()
            .filter(|(key, _)| !is_meta_field(key) && key != "uid"),
    );
    let mut admin = parse_valid::<Admin>(merged)?;
    admin.email = admin.email.trim().to_lowercase();
    admin.uid = existing.data.uid.clone();

    let email_changed = admin.email != existing.data.email;
    if email_changed {
        ensure_email_free(&state, &admin.email, Some(&id)).await?;
        admin.uid = None;
    }

    let record = state
        .facade
        .update(&id, &admin)
        .await?
        .ok_or_else(|| not_found::<Admin>(&id))?;

    let revoked = match (&existing.data.uid, email_changed) {
        (Some(uid), true) => state.identity.revoke_user(uid).await?,
        _ => 0,
    };

    tracing::info!(
        admin_id = %id,
        role = %record.data.role,
        email_changed,
        revoked_sessions = revoked,
        updated_by = %user.uid,
        "Admin updated"
    );
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/admin/admins/{id}
///
/// Removes console access. Every open session of the deleted admin is
/// revoked at the identity provider, which in turn drops them from the
/// session context. Admins cannot delete themselves.
pub async fn delete_admin(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if id == user.admin_id {
        return Err(AppError::Core(CoreError::Conflict(
            "Admins cannot delete their own record".into(),
        )));
    }

    let admin = state
        .facade
        .get::<Admin>(&id)
        .await?
        .ok_or_else(|| not_found::<Admin>(&id))?;

    state
        .facade
        .delete::<Admin>(&id)
        .await?
        .ok_or_else(|| not_found::<Admin>(&id))?;

    let revoked = match &admin.data.uid {
        Some(uid) => state.identity.revoke_user(uid).await?,
        None => 0,
    };

    tracing::info!(
        admin_id = %id,
        email = %admin.data.email,
        revoked_sessions = revoked,
        deleted_by = %user.uid,
        "Admin deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
