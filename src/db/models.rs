use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::MockExamStatus;
use crate::schemas::generation::GeneratedTaskItem;

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) is_active: bool,
    pub(crate) is_admin: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

/// A task extracted from a past exam sheet. Read-only for this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamTask {
    pub(crate) id: i64,
    pub(crate) content: String,
    pub(crate) task_number: String,
    pub(crate) exam_sheet_name: String,
    pub(crate) year: Option<i32>,
    pub(crate) level: String,
    pub(crate) subject: Option<String>,
    pub(crate) page: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct GeneratedTask {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) prompt: String,
    pub(crate) generated_text: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserAnswer {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) generated_task_id: i64,
    pub(crate) task_index: i32,
    pub(crate) task_content: String,
    pub(crate) user_answer: String,
    pub(crate) correct_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) answered_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct MockExam {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) exam_type: String,
    pub(crate) level: String,
    pub(crate) task_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) finished_at: Option<PrimitiveDateTime>,
    pub(crate) time_elapsed_seconds: Option<i32>,
    pub(crate) status: MockExamStatus,
    pub(crate) tasks_data: Json<Vec<GeneratedTaskItem>>,
    pub(crate) user_answers: Option<Json<BTreeMap<u32, String>>>,
    pub(crate) score: Option<i32>,
    pub(crate) max_score: i32,
    pub(crate) percentage: Option<f64>,
}

/// A review joined with its author's username.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Review {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) rating: i32,
    pub(crate) comment: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: Option<PrimitiveDateTime>,
}
