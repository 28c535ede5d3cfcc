//! Frequently asked questions.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const FAQ_STATUSES: &[&str] = &["published", "draft"];

fn default_status() -> String {
    "draft".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Faq {
    #[validate(length(min = 5, message = "must be at least 5 characters"))]
    pub question: String,
    #[validate(length(min = 1, message = "is required"))]
    pub answer: String,
    pub category: Option<String>,
    /// Display position; lower comes first.
    pub position: Option<i32>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Faq {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "faqs",
        label: "FAQ",
        search_fields: &["question", "answer", "category"],
        filter_fields: &["status", "category"],
        status: Some(StatusSpec {
            field: "status",
            values: FAQ_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Question", "question"),
            Column::new("Answer", "answer"),
            Column::new("Category", "category"),
            Column::new("Status", "status"),
        ],
    };
}
