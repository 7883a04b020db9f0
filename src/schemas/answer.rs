use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitAnswerRequest {
    pub(crate) generated_task_id: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "taskIndex must not be negative"))]
    pub(crate) task_index: i32,
    #[validate(length(min = 1, max = 500, message = "userAnswer must contain 1..500 characters"))]
    pub(crate) user_answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitAnswerResponse {
    pub(crate) success: bool,
    pub(crate) is_correct: bool,
    pub(crate) correct_answer: String,
    pub(crate) solution: String,
    pub(crate) user_answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerStatsResponse {
    pub(crate) total_answers: i64,
    pub(crate) correct_answers: i64,
    pub(crate) wrong_answers: i64,
    pub(crate) accuracy: f64,
}
