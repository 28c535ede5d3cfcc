//! Recorded course videos.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const COURSE_VIDEO_STATUSES: &[&str] = &["draft", "published"];

fn default_status() -> String {
    "draft".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CourseVideo {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    pub description: Option<String>,
    pub workshop_id: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub video_url: String,
    /// Object path when the video was uploaded rather than linked.
    pub video_path: Option<String>,
    pub duration_secs: Option<u32>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for CourseVideo {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "course_videos",
        label: "Course video",
        search_fields: &["title", "description"],
        filter_fields: &["status", "workshop_id"],
        status: Some(StatusSpec {
            field: "status",
            values: COURSE_VIDEO_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Title", "title"),
            Column::new("Workshop", "workshop_id"),
            Column::new("URL", "video_url"),
            Column::new("Duration (s)", "duration_secs"),
            Column::new("Status", "status"),
        ],
    };

    fn object_paths(&self) -> Vec<String> {
        self.video_path.iter().cloned().collect()
    }
}
