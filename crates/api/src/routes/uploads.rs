//! Route definitions for object uploads.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Routes mounted at `/admin/uploads`.
///
/// The default body limit is lifted here; the upload handler enforces
/// `MAX_UPLOAD_BYTES` while reading the stream.
///
/// ```text
/// POST   /{folder}   -> upload (multipart)
/// DELETE /?path=     -> delete_object
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", delete(uploads::delete_object))
        .route("/{folder}", post(uploads::upload))
        .layer(DefaultBodyLimit::disable())
}
