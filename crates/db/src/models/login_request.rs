//! Access requests created by self-service sign-up.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const LOGIN_REQUEST_STATUSES: &[&str] = &["pending", "approved", "rejected"];

pub const STATUS_PENDING: &str = "pending";

fn default_status() -> String {
    STATUS_PENDING.into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub name: Option<String>,
    /// Identity provider user id created at sign-up.
    pub uid: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for LoginRequest {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "login_requests",
        label: "Login request",
        search_fields: &["email", "name"],
        filter_fields: &["status"],
        status: Some(StatusSpec {
            field: "status",
            values: LOGIN_REQUEST_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Email", "email"),
            Column::new("Name", "name"),
            Column::new("Status", "status"),
            Column::new("Requested", "created_at"),
        ],
    };
}
