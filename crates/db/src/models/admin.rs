//! Console administrators.
//!
//! An identity may sign in only if an `admins` document carries its email.

use atelier_core::error::CoreError;
use atelier_core::roles::{is_admin_role, ROLE_ADMIN, VALID_ROLES};
use atelier_core::schema::{Column, EntitySchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

fn default_role() -> String {
    ROLE_ADMIN.into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Admin {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    /// Identity provider user id, filled in on first sign-in.
    pub uid: Option<String>,
}

impl Entity for Admin {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "admins",
        label: "Admin",
        search_fields: &["name", "email"],
        filter_fields: &["role"],
        status: None,
        revenue: None,
        export_columns: &[
            Column::new("Name", "name"),
            Column::new("Email", "email"),
            Column::new("Role", "role"),
            Column::new("Added", "created_at"),
        ],
    };

    const SUPER_ADMIN_ONLY: bool = true;

    fn check(&self) -> Result<(), CoreError> {
        if !is_admin_role(&self.role) {
            return Err(CoreError::Validation(format!(
                "role: must be one of {VALID_ROLES:?}"
            )));
        }
        Ok(())
    }
}
