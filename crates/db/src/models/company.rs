//! Partner and hiring companies.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const COMPANY_STATUSES: &[&str] = &["active", "inactive"];

fn default_status() -> String {
    "active".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Company {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub logo_url: Option<String>,
    pub logo_path: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Company {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "companies",
        label: "Company",
        search_fields: &["name", "industry", "website"],
        filter_fields: &["status", "industry"],
        status: Some(StatusSpec {
            field: "status",
            values: COMPANY_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Name", "name"),
            Column::new("Industry", "industry"),
            Column::new("Website", "website"),
            Column::new("Status", "status"),
        ],
    };

    fn object_paths(&self) -> Vec<String> {
        self.logo_path.iter().cloned().collect()
    }
}
