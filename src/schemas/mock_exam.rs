use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::MockExamStatus;

fn default_level() -> String {
    "podstawowy".to_string()
}

const fn default_task_count() -> i32 {
    40
}

const fn default_time_limit() -> i32 {
    150
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartMockExamRequest {
    #[serde(default = "default_level")]
    pub(crate) level: String,
    #[serde(default = "default_task_count")]
    #[validate(range(min = 1, max = 50, message = "taskCount must be in range 1..50"))]
    pub(crate) task_count: i32,
    #[serde(default = "default_time_limit")]
    #[validate(range(min = 30, max = 300, message = "timeLimitMinutes must be in range 30..300"))]
    pub(crate) time_limit_minutes: i32,
    #[serde(default)]
    pub(crate) topics: Option<Vec<String>>,
}

/// Answers keyed by 0-based task index. JSON object keys arrive as strings.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitMockExamRequest {
    #[serde(default)]
    pub(crate) answers: BTreeMap<u32, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MockExamQuestion {
    pub(crate) index: usize,
    pub(crate) content: String,
    pub(crate) answers: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MockExamStartResponse {
    pub(crate) exam_id: i64,
    pub(crate) level: String,
    pub(crate) task_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) tasks: Vec<MockExamQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TaskResult {
    pub(crate) index: usize,
    pub(crate) content: String,
    pub(crate) answers: Option<Vec<String>>,
    pub(crate) user_answer: Option<String>,
    pub(crate) correct_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) solution: String,
    pub(crate) points_earned: i32,
    pub(crate) max_points: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopicPerformance {
    pub(crate) by_topic: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MockExamReport {
    pub(crate) id: i64,
    pub(crate) level: String,
    pub(crate) task_count: i32,
    pub(crate) started_at: String,
    pub(crate) finished_at: String,
    pub(crate) time_elapsed_seconds: i32,
    pub(crate) score: i32,
    pub(crate) max_score: i32,
    pub(crate) percentage: f64,
    pub(crate) task_results: Vec<TaskResult>,
    pub(crate) topic_performance: TopicPerformance,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MockExamSummary {
    pub(crate) id: i64,
    pub(crate) level: String,
    pub(crate) task_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) started_at: String,
    pub(crate) finished_at: Option<String>,
    pub(crate) time_elapsed_seconds: Option<i32>,
    pub(crate) status: MockExamStatus,
    pub(crate) score: Option<i32>,
    pub(crate) percentage: Option<f64>,
}
