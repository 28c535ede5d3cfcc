//! Quizzes attached to workshops.

use atelier_core::error::CoreError;
use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const QUIZ_STATUSES: &[&str] = &["draft", "published"];

fn default_status() -> String {
    "draft".into()
}

/// One multiple-choice question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QuizQuestion {
    #[validate(length(min = 1, message = "is required"))]
    pub question: String,
    #[validate(length(min = 2, message = "needs at least 2 options"))]
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_option: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Quiz {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    pub workshop_id: Option<String>,
    #[validate(nested)]
    pub questions: Vec<QuizQuestion>,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub pass_percentage: Option<u8>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for Quiz {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "quizzes",
        label: "Quiz",
        search_fields: &["title"],
        filter_fields: &["status", "workshop_id"],
        status: Some(StatusSpec {
            field: "status",
            values: QUIZ_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Title", "title"),
            Column::new("Workshop", "workshop_id"),
            Column::new("Pass %", "pass_percentage"),
            Column::new("Status", "status"),
        ],
    };

    fn check(&self) -> Result<(), CoreError> {
        for (index, q) in self.questions.iter().enumerate() {
            if q.correct_option >= q.options.len() {
                return Err(CoreError::Validation(format!(
                    "questions[{index}].correct_option: must reference one of the {} options",
                    q.options.len()
                )));
            }
            if q.options.iter().any(|o| o.trim().is_empty()) {
                return Err(CoreError::Validation(format!(
                    "questions[{index}].options: must not contain blank options"
                )));
            }
        }
        Ok(())
    }
}
