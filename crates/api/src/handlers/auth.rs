//! Handlers for the `/auth` resource (login, signup, logout, session).

use atelier_core::error::CoreError;
use atelier_core::validation::{require_non_blank, validate_email, validate_password_strength};
use atelier_db::models::admin::Admin;
use atelier_db::models::login_request::{LoginRequest, STATUS_PENDING};
use atelier_db::models::Record;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::session::SessionEntry;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub admin: Record<Admin>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Sign in with email + password. Only identities with an `admins` record
/// are admitted: wrong credentials are 401, a valid non-admin identity 403.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    require_non_blank("email", &input.email)?;
    require_non_blank("password", &input.password)?;

    let (signed_in, mut admin) = state
        .sessions
        .login(
            state.identity.as_ref(),
            &state.facade,
            &input.email,
            &input.password,
        )
        .await?;

    // Link the admin record to its identity on first sign-in so deleting the
    // record can revoke the identity's sessions.
    if admin.data.uid.as_deref() != Some(signed_in.uid.as_str()) {
        admin.data.uid = Some(signed_in.uid.clone());
        match state.facade.update(&admin.id, &admin.data).await {
            Ok(Some(updated)) => admin = updated,
            Ok(None) => tracing::warn!(admin_id = %admin.id, "Admin vanished during sign-in"),
            Err(e) => {
                tracing::warn!(admin_id = %admin.id, error = %e, "Failed to link admin to identity");
            }
        }
    }

    Ok(Json(LoginResponse {
        token: signed_in.token,
        expires_in: signed_in.expires_in,
        admin,
    }))
}

/// POST /api/v1/auth/signup
///
/// Register credentials and file a pending login request. Access is only
/// granted once a super admin approves the request.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<impl IntoResponse> {
    validate_email(&input.email)?;
    validate_password_strength(&input.password)?;

    let uid = state.identity.sign_up(&input.email, &input.password).await?;

    let request = state
        .facade
        .create(&LoginRequest {
            email: input.email.trim().to_lowercase(),
            name: input.name.filter(|n| !n.trim().is_empty()),
            uid: Some(uid.clone()),
            status: STATUS_PENDING.into(),
        })
        .await?;

    tracing::info!(uid = %uid, request_id = %request.id, "Sign-up received; access pending");
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// POST /api/v1/auth/logout
///
/// End the current session. The token stops working immediately.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    state
        .sessions
        .logout(state.identity.as_ref(), &user.session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
///
/// The identity and admin behind the current token, with the admin's
/// current role and name.
pub async fn session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<SessionEntry>>> {
    let mut entry = state.sessions.get(&user.session_id).await.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Session is no longer active".into()))
    })?;
    entry.role = user.role;
    entry.admin_name = user.admin_name;
    Ok(Json(DataResponse { data: entry }))
}
