//! Trainers shown on workshop pages.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const TRAINER_STATUSES: &[&str] = &["active", "inactive"];

fn default_status() -> String {
    "active".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Trainer {
    #[validate(length(min = 2, message = "must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
    pub linkedin_url: Option<String>,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Trainer {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "trainers",
        label: "Trainer",
        search_fields: &["name", "email", "bio", "expertise"],
        filter_fields: &["status"],
        status: Some(StatusSpec {
            field: "status",
            values: TRAINER_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Name", "name"),
            Column::new("Email", "email"),
            Column::new("Expertise", "expertise"),
            Column::new("Status", "status"),
        ],
    };

    fn object_paths(&self) -> Vec<String> {
        self.photo_path.iter().cloned().collect()
    }
}
