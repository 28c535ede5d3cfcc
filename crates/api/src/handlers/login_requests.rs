//! Review of access requests created by sign-up.

use atelier_core::error::CoreError;
use atelier_core::roles::ROLE_ADMIN;
use atelier_db::models::admin::Admin;
use atelier_db::models::login_request::{LoginRequest, STATUS_PENDING};
use atelier_db::models::Record;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::crud::not_found;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireSuperAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const STATUS_APPROVED: &str = "approved";
const STATUS_REJECTED: &str = "rejected";

/// Response of an approval: the updated request and the admin it created.
#[derive(Debug, Serialize)]
pub struct Approval {
    pub request: Record<LoginRequest>,
    pub admin: Record<Admin>,
}

/// Load a request that is still awaiting review.
async fn pending_request(
    state: &AppState,
    id: &str,
) -> AppResult<Record<LoginRequest>> {
    let request = state
        .facade
        .get::<LoginRequest>(id)
        .await?
        .ok_or_else(|| not_found::<LoginRequest>(id))?;
    if request.data.status != STATUS_PENDING {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Login request is already {}",
            request.data.status
        ))));
    }
    Ok(request)
}

/// POST /api/v1/admin/login-requests/{id}/approve
///
/// Creates an `admin`-role record for the requester (reusing an existing
/// one with the same email) and marks the request approved.
pub async fn approve(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let request = pending_request(&state, &id).await?;
    let email = request.data.email.trim().to_lowercase();

    let admin = match state.facade.find_by::<Admin>("email", email.as_str()).await? {
        Some(existing) => existing,
        None => {
            let name = request
                .data
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| email.clone());
            state
                .facade
                .create(&Admin {
                    name,
                    email: email.clone(),
                    role: ROLE_ADMIN.into(),
                    uid: request.data.uid.clone(),
                })
                .await?
        }
    };

    let approved = LoginRequest {
        status: STATUS_APPROVED.into(),
        ..request.data
    };
    let request = state
        .facade
        .update(&id, &approved)
        .await?
        .ok_or_else(|| not_found::<LoginRequest>(&id))?;

    tracing::info!(
        request_id = %id,
        admin_id = %admin.id,
        approved_by = %user.uid,
        "Login request approved"
    );
    Ok(Json(DataResponse {
        data: Approval { request, admin },
    }))
}

/// POST /api/v1/admin/login-requests/{id}/reject
pub async fn reject(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let request = pending_request(&state, &id).await?;
    let rejected = LoginRequest {
        status: STATUS_REJECTED.into(),
        ..request.data
    };
    let request = state
        .facade
        .update(&id, &rejected)
        .await?
        .ok_or_else(|| not_found::<LoginRequest>(&id))?;

    tracing::info!(request_id = %id, rejected_by = %user.uid, "Login request rejected");
    Ok(Json(DataResponse { data: request }))
}
