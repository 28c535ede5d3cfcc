//! Student project showcase submissions.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const STUDENT_PROJECT_STATUSES: &[&str] = &["pending", "approved", "featured"];

fn default_status() -> String {
    "pending".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StudentProject {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub student_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub student_email: Option<String>,
    pub description: Option<String>,
    pub workshop_id: Option<String>,
    pub project_url: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for StudentProject {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "student_projects",
        label: "Student project",
        search_fields: &["title", "student_name", "description"],
        filter_fields: &["status", "workshop_id"],
        status: Some(StatusSpec {
            field: "status",
            values: STUDENT_PROJECT_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Title", "title"),
            Column::new("Student", "student_name"),
            Column::new("Email", "student_email"),
            Column::new("Project URL", "project_url"),
            Column::new("Status", "status"),
        ],
    };

    fn object_paths(&self) -> Vec<String> {
        self.image_path.iter().cloned().collect()
    }
}
