use atelier_core::schema::{Column, EntitySchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

/// A milestone on the "our journey" timeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Journey {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    pub description: Option<String>,
    /// Free-form period label such as `2021` or `Q3 2024`.
    pub year: Option<String>,
    pub position: Option<i32>,
}

impl Entity for Journey {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "journeys",
        label: "Journey",
        search_fields: &["title", "description", "year"],
        filter_fields: &["year"],
        status: None,
        revenue: None,
        export_columns: &[
            Column::new("Year", "year"),
            Column::new("Title", "title"),
            Column::new("Description", "description"),
        ],
    };
}
