use atelier_core::schema::{Column, EntitySchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

/// A selling point shown on the landing page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Feature {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    pub icon: Option<String>,
    pub position: Option<i32>,
}

impl Entity for Feature {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "features",
        label: "Feature",
        search_fields: &["title", "description"],
        filter_fields: &[],
        status: None,
        revenue: None,
        export_columns: &[
            Column::new("Title", "title"),
            Column::new("Description", "description"),
            Column::new("Icon", "icon"),
        ],
    };
}
