//! Route definitions for the dashboard.

use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Routes mounted at `/admin/dashboard`.
///
/// ```text
/// GET  /   -> overview
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard::overview))
}
