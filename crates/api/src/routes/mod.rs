pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod health;
pub mod resources;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                 login (public)
/// /auth/signup                                signup (public)
/// /auth/logout                                logout (requires auth)
/// /auth/session                               current session (requires auth)
///
/// /admin/{resource}                           list, create
/// /admin/{resource}/stats                     status counters (GET)
/// /admin/{resource}/export                    CSV / JSON attachment (GET)
/// /admin/{resource}/{id}                      get, update, delete
///
///   resources: workshops, certificates, registrations, trainers,
///   pricing-plans, faqs, features, scholarships, companies, journeys,
///   student-projects, quizzes, course-videos, login-requests,
///   admins (super admin only)
///
/// /admin/login-requests/{id}/approve          approve, creating an admin (POST)
/// /admin/login-requests/{id}/reject           reject (POST)
///
/// /admin/chats                                list threads (GET)
/// /admin/chats/{user_id}/messages             list, send (GET, POST)
/// /admin/chats/{user_id}/read                 reset unread counter (POST)
/// /admin/chats/{user_id}/subscribe            live thread WebSocket (?token=)
///
/// /admin/uploads/{folder}                     upload (multipart POST)
/// /admin/uploads?path=                        delete object (DELETE)
///
/// /admin/dashboard                            overview snapshot (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin_routes())
}

/// Everything under `/admin`. Every route requires an active admin session.
fn admin_routes() -> Router<AppState> {
    resources::router()
        .nest("/chats", chat::router())
        .nest("/uploads", uploads::router())
        .nest("/dashboard", dashboard::router())
}
