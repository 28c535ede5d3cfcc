//! Handler for the dashboard overview.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/dashboard
///
/// The last snapshot computed by the refresh task. Before the first refresh
/// has run, one is computed on the spot.
pub async fn overview(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let snapshot = match state.dashboard.get().await {
        Some(snapshot) => snapshot,
        None => state.dashboard.refresh(&state.facade).await?,
    };
    Ok(Json(DataResponse { data: snapshot }))
}
