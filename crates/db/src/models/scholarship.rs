//! Scholarship applications.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const SCHOLARSHIP_STATUSES: &[&str] = &["pending", "approved", "rejected"];

fn default_status() -> String {
    "pending".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Scholarship {
    #[validate(length(min = 1, message = "is required"))]
    pub applicant_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub workshop_id: Option<String>,
    #[validate(length(min = 10, message = "must be at least 10 characters"))]
    pub reason: String,
    pub reviewer_notes: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Scholarship {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "scholarships",
        label: "Scholarship",
        search_fields: &["applicant_name", "email", "reason"],
        filter_fields: &["status", "workshop_id"],
        status: Some(StatusSpec {
            field: "status",
            values: SCHOLARSHIP_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Applicant", "applicant_name"),
            Column::new("Email", "email"),
            Column::new("Phone", "phone"),
            Column::new("Reason", "reason"),
            Column::new("Status", "status"),
            Column::new("Applied", "created_at"),
        ],
    };
}
