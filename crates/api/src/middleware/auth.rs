//! Session-token authentication extractor for Axum handlers.

use atelier_core::error::CoreError;
use atelier_core::types::DocId;
use atelier_db::models::admin::Admin;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The admin behind a bearer token in the `Authorization` header.
///
/// The token must verify with the identity provider *and* belong to a
/// session the session context still holds. Role and name come from the
/// current `admins` record, so a demotion applies to open sessions.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(uid = %user.uid, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity provider user id.
    pub uid: String,
    pub email: String,
    pub session_id: String,
    /// Id of the matching `admins` document.
    pub admin_id: DocId,
    pub admin_name: String,
    /// `admin` or `super_admin`.
    pub role: String,
}

/// Resolve a raw token to its admin. Shared by the header extractor and the
/// WebSocket `?token=` handshake.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = state.identity.verify(token).await.map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    let entry = state.sessions.get(&claims.sid).await.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Session is no longer active".into()))
    })?;

    // The record may have been deleted or re-pointed at another email
    // since sign-in.
    let admin = state
        .facade
        .get::<Admin>(&entry.admin_id)
        .await?
        .filter(|admin| admin.data.email == entry.email)
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Admin access has been withdrawn".into(),
            ))
        })?;

    Ok(AuthUser {
        uid: entry.uid,
        email: entry.email,
        session_id: entry.session_id,
        admin_id: entry.admin_id,
        admin_name: admin.data.name,
        role: admin.data.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        authenticate(state, token).await
    }
}
