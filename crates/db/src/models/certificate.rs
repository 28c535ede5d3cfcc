//! Completion certificates issued to participants.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const CERTIFICATE_STATUSES: &[&str] = &["issued", "pending", "revoked"];

fn default_status() -> String {
    "pending".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Certificate {
    #[validate(length(min = 1, message = "is required"))]
    pub recipient_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub recipient_email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub certificate_number: String,
    pub workshop_id: Option<String>,
    pub workshop_title: Option<String>,
    pub issue_date: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Certificate {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "certificates",
        label: "Certificate",
        search_fields: &[
            "recipient_name",
            "recipient_email",
            "certificate_number",
            "workshop_title",
        ],
        filter_fields: &["status", "workshop_id"],
        status: Some(StatusSpec {
            field: "status",
            values: CERTIFICATE_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Certificate Number", "certificate_number"),
            Column::new("Recipient", "recipient_name"),
            Column::new("Email", "recipient_email"),
            Column::new("Workshop", "workshop_title"),
            Column::new("Issue Date", "issue_date"),
            Column::new("Status", "status"),
        ],
    };
}
