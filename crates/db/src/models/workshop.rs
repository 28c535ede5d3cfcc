//! Workshops offered on the public site.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const WORKSHOP_STATUSES: &[&str] = &["draft", "published", "completed", "cancelled"];

fn default_status() -> String {
    "draft".into()
}

/// Body of a `workshops` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Workshop {
    #[validate(length(min = 3, message = "must be at least 3 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    pub trainer_id: Option<String>,
    /// ISO date (`YYYY-MM-DD`) as entered in the form.
    pub date: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub capacity: Option<u32>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Workshop {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "workshops",
        label: "Workshop",
        search_fields: &["title", "description", "location"],
        filter_fields: &["status", "trainer_id"],
        status: Some(StatusSpec {
            field: "status",
            values: WORKSHOP_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("ID", "id"),
            Column::new("Title", "title"),
            Column::new("Date", "date"),
            Column::new("Location", "location"),
            Column::new("Price", "price"),
            Column::new("Capacity", "capacity"),
            Column::new("Status", "status"),
            Column::new("Created", "created_at"),
        ],
    };

    fn object_paths(&self) -> Vec<String> {
        self.image_path.iter().cloned().collect()
    }
}
