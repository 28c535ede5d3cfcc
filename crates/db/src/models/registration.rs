//! Workshop registrations.
//!
//! `workshop_id` is a plain string: deleting the workshop leaves its
//! registrations in place.

use atelier_core::schema::{Column, EntitySchema, RevenueSpec, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const REGISTRATION_STATUSES: &[&str] = &["pending", "confirmed", "cancelled"];

fn default_status() -> String {
    "pending".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub workshop_id: String,
    pub workshop_title: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub amount: Option<f64>,
    pub payment_reference: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Registration {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "registrations",
        label: "Registration",
        search_fields: &["name", "email", "workshop_title", "payment_reference"],
        filter_fields: &["status", "workshop_id"],
        status: Some(StatusSpec {
            field: "status",
            values: REGISTRATION_STATUSES,
        }),
        revenue: Some(RevenueSpec {
            amount_field: "amount",
            statuses: &["confirmed"],
        }),
        export_columns: &[
            Column::new("Name", "name"),
            Column::new("Email", "email"),
            Column::new("Phone", "phone"),
            Column::new("Workshop", "workshop_title"),
            Column::new("Amount", "amount"),
            Column::new("Status", "status"),
            Column::new("Registered", "created_at"),
        ],
    };
}
